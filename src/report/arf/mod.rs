/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{borrow::Cow, net::IpAddr};

use super::{
    ArfReport, Feedback, FeedbackType, OriginalMessage, FEEDBACK_REPORT_VERSION, USER_AGENT,
};

pub mod builder;
pub mod generate;
pub mod parse;

impl<'x> Default for Feedback<'x> {
    fn default() -> Self {
        Feedback {
            feedback_type: FeedbackType::Abuse,
            user_agent: USER_AGENT.into(),
            version: FEEDBACK_REPORT_VERSION,
            arrival_date: None,
            authentication_results: Vec::new(),
            incidents: 1,
            original_envelope_id: None,
            original_mail_from: None,
            original_rcpt_to: Vec::new(),
            reported_domain: Vec::new(),
            reported_uri: Vec::new(),
            reporting_mta: None,
            source_ip: None,
        }
    }
}

impl<'x> Feedback<'x> {
    pub fn new(feedback_type: FeedbackType) -> Self {
        Feedback {
            feedback_type,
            ..Default::default()
        }
    }

    pub fn feedback_type(&self) -> FeedbackType {
        self.feedback_type
    }

    pub fn with_feedback_type(mut self, value: FeedbackType) -> Self {
        self.feedback_type = value;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn with_user_agent(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.user_agent = value.into();
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn with_version(mut self, value: u32) -> Self {
        self.version = value.max(1);
        self
    }

    pub fn arrival_date(&self) -> Option<&str> {
        self.arrival_date.as_deref()
    }

    pub fn with_arrival_date(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.arrival_date = Some(value.into());
        self
    }

    pub fn authentication_results(&self) -> &[Cow<'x, str>] {
        &self.authentication_results
    }

    pub fn with_authentication_results(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.authentication_results.push(value.into());
        self
    }

    pub fn incidents(&self) -> u32 {
        self.incidents
    }

    pub fn with_incidents(mut self, value: u32) -> Self {
        self.incidents = value.max(1);
        self
    }

    pub fn original_envelope_id(&self) -> Option<&str> {
        self.original_envelope_id.as_deref()
    }

    pub fn with_original_envelope_id(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.original_envelope_id = Some(value.into());
        self
    }

    pub fn original_mail_from(&self) -> Option<&str> {
        self.original_mail_from.as_deref()
    }

    pub fn with_original_mail_from(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.original_mail_from = Some(value.into());
        self
    }

    pub fn original_rcpt_to(&self) -> &[Cow<'x, str>] {
        &self.original_rcpt_to
    }

    pub fn with_original_rcpt_to(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.original_rcpt_to.push(value.into());
        self
    }

    pub fn reported_domain(&self) -> &[Cow<'x, str>] {
        &self.reported_domain
    }

    pub fn with_reported_domain(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.reported_domain.push(value.into());
        self
    }

    pub fn reported_uri(&self) -> &[Cow<'x, str>] {
        &self.reported_uri
    }

    pub fn with_reported_uri(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.reported_uri.push(value.into());
        self
    }

    pub fn reporting_mta(&self) -> Option<&str> {
        self.reporting_mta.as_deref()
    }

    pub fn with_reporting_mta(mut self, value: impl Into<Cow<'x, str>>) -> Self {
        self.reporting_mta = Some(value.into());
        self
    }

    pub fn source_ip(&self) -> Option<IpAddr> {
        self.source_ip
    }

    pub fn with_source_ip(mut self, value: IpAddr) -> Self {
        self.source_ip = Some(value);
        self
    }

    pub fn into_owned<'y>(self) -> Feedback<'y> {
        Feedback {
            feedback_type: self.feedback_type,
            user_agent: self.user_agent.into_owned().into(),
            version: self.version,
            arrival_date: self.arrival_date.map(|v| v.into_owned().into()),
            authentication_results: into_owned_list(self.authentication_results),
            incidents: self.incidents,
            original_envelope_id: self.original_envelope_id.map(|v| v.into_owned().into()),
            original_mail_from: self.original_mail_from.map(|v| v.into_owned().into()),
            original_rcpt_to: into_owned_list(self.original_rcpt_to),
            reported_domain: into_owned_list(self.reported_domain),
            reported_uri: into_owned_list(self.reported_uri),
            reporting_mta: self.reporting_mta.map(|v| v.into_owned().into()),
            source_ip: self.source_ip,
        }
    }
}

fn into_owned_list<'y>(list: Vec<Cow<'_, str>>) -> Vec<Cow<'y, str>> {
    list.into_iter().map(|v| v.into_owned().into()).collect()
}

impl<'x> ArfReport<'x> {
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn human_text(&self) -> &str {
        &self.human_text
    }

    pub fn feedback(&self) -> &Feedback<'x> {
        &self.feedback
    }

    pub fn original(&self) -> &OriginalMessage<'x> {
        &self.original
    }

    pub fn original_message(&self) -> &[u8] {
        self.original.as_bytes()
    }

    pub fn into_owned<'y>(self) -> ArfReport<'y> {
        ArfReport {
            from: self.from.into_owned().into(),
            to: self.to.into_owned().into(),
            subject: self.subject.into_owned().into(),
            human_text: self.human_text.into_owned().into(),
            feedback: self.feedback.into_owned(),
            original: self.original.into_owned(),
        }
    }
}
