/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{
    fs,
    io::{self, Write},
    process,
};

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use mail_arf::{
    report::{
        arf::builder::{recipient_address, sender_address},
        ArfReport,
    },
    transport::{SmtpConfig, SmtpSender},
    Error, HeaderStore,
};

fn main() {
    let matches = Command::new("arf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sends an Abuse Reporting Format (RFC 5965) report for a received message")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("email.msg")
                .help("Raw email message used to build the ARF report")
                .required(true),
        )
        .arg(
            Arg::new("abuse")
                .short('a')
                .long("abuse")
                .value_name("abuse@example.com")
                .help("Abuse address to report to, defaults to abuse@ the sender's domain"),
        )
        .arg(
            Arg::new("smtp-server")
                .short('s')
                .long("smtp-server")
                .value_name("HOST")
                .help("SMTP server name or IP address")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("port")
                .short('P')
                .long("port")
                .value_name("PORT")
                .help("Port number of the SMTP server")
                .value_parser(clap::value_parser!(u16))
                .default_value("25"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("USERNAME")
                .help("Username for SMTP authentication"),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Password for SMTP authentication"),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .value_name("ADDRESS")
                .help("Reporter address, defaults to the first recipient of the message"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Print the report without sending it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging, including the original header lines")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("debug") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(err) = run(&matches) {
        log::error!("{err}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> mail_arf::Result<()> {
    let file = matches
        .get_one::<String>("file")
        .ok_or_else(|| Error::Io("No message file provided.".to_string()))?;
    let raw_message = fs::read(file)?;

    if log::log_enabled!(log::Level::Debug) {
        for header in HeaderStore::parse(&raw_message)?.iter() {
            log::debug!("Original header {}: {}", header.name(), header.value());
        }
    }

    let reporter = match matches.get_one::<String>("from") {
        Some(from) => from.clone(),
        None => recipient_address(&raw_message).ok_or_else(|| {
            Error::MalformedSenderAddress("message has no recipients".to_string())
        })?,
    };
    let abuse = matches.get_one::<String>("abuse").map(String::as_str);

    let report = ArfReport::from_message(&raw_message, &reporter, abuse)?;

    log::info!(
        "Original sender: {}",
        sender_address(&raw_message).as_deref().unwrap_or("unknown")
    );
    log::info!("Reporting to {} as {}.", report.to(), report.from());

    let message = report.to_rfc5322_bytes()?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&message)?;
    stdout.flush()?;

    if matches.get_flag("dry-run") {
        return Ok(());
    }

    let config = SmtpConfig::new(
        matches
            .get_one::<String>("smtp-server")
            .map_or("localhost", String::as_str),
        matches.get_one::<u16>("port").copied().unwrap_or(25),
    )
    .with_credentials(
        matches.get_one::<String>("user").cloned(),
        matches.get_one::<String>("password").cloned(),
    );

    SmtpSender::new(config).send_raw(report.from(), report.to(), &message)?;
    log::info!("Report sent to {}.", report.to());

    Ok(())
}
