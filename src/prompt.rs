//! Interactive input for subject fields, validity dates and DNS names.
//!
//! Reads from any `BufRead` and writes prompts to any `Write`, so the command layer can
//! drive it from stdin/stdout and tests can drive it from a byte buffer.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::io::{BufRead, Write};

use crate::template::{CertificateData, SubjectIdentity, ValidityWindow};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Where prompts and status messages go.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Print `prompt` and read one line. End of input reads as an empty answer.
    pub fn prompt_string(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt).context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask until the answer parses with `format`. An empty answer means now.
    pub fn prompt_date(&mut self, prompt: &str, format: &str) -> Result<DateTime<Utc>> {
        loop {
            let text = self.prompt_string(prompt)?;
            if text.trim().is_empty() {
                return Ok(Utc::now());
            }

            match parse_date(&text, format) {
                Some(date) => return Ok(date),
                None => writeln!(self.output, "Invalid date").context("Failed to write")?,
            }
        }
    }

    pub fn prompt_subject(&mut self) -> Result<SubjectIdentity> {
        Ok(SubjectIdentity {
            country: self.prompt_string("Country Code: ")?,
            organization: self.prompt_string("Organization: ")?,
            common_name: self.prompt_string("Common Name: ")?,
        })
    }

    pub fn prompt_certificate_data(&mut self, date_format: &str) -> Result<CertificateData> {
        let subject = self.prompt_subject()?;
        let not_before =
            self.prompt_date("Not Before (YYYY-MM-DD hh:mm:ss UTC): ", date_format)?;
        let not_after =
            self.prompt_date("Not After (YYYY-MM-DD hh:mm:ss UTC):  ", date_format)?;
        Ok(CertificateData {
            subject,
            validity: ValidityWindow::new(not_before, not_after),
        })
    }

    /// Collect `DNS.n` answers until an empty one.
    pub fn prompt_dns_names(&mut self) -> Result<Vec<String>> {
        writeln!(self.output, "SAN DNS Names (empty to stop):").context("Failed to write")?;
        let mut names = Vec::new();
        loop {
            let answer = self.prompt_string(&format!("DNS.{} = ", names.len() + 1))?;
            if answer.is_empty() {
                break;
            }
            names.push(answer);
        }
        Ok(names)
    }
}

/// Dates are always UTC; a trailing `UTC` zone marker is accepted and ignored.
fn parse_date(text: &str, format: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = text.strip_suffix("UTC").map(str::trim_end).unwrap_or(text);
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::DEFAULT_DATE_FORMAT;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2030, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(
            parse_date("2030-06-01 12:30:00 UTC", DEFAULT_DATE_FORMAT),
            Some(expected)
        );
        assert_eq!(
            parse_date("2030-06-01 12:30:00", DEFAULT_DATE_FORMAT),
            Some(expected)
        );
        assert_eq!(parse_date("tomorrow", DEFAULT_DATE_FORMAT), None);
    }

    #[test]
    fn test_prompt_subject() {
        let mut p = prompter("US\r\nAcme\nAcme Root\n");
        let subject = p.prompt_subject().unwrap();
        assert_eq!(subject.country, "US");
        assert_eq!(subject.organization, "Acme");
        assert_eq!(subject.common_name, "Acme Root");

        let shown = String::from_utf8(p.output().clone()).unwrap();
        assert!(shown.contains("Country Code: "));
        assert!(shown.contains("Common Name: "));
    }

    #[test]
    fn test_invalid_date_reprompts() {
        let mut p = prompter("not a date\n2031-01-01 00:00:00 UTC\n");
        let date = p.prompt_date("When: ", DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap());

        let shown = String::from_utf8(p.output().clone()).unwrap();
        assert_eq!(shown.matches("When: ").count(), 2);
        assert!(shown.contains("Invalid date"));
    }

    #[test]
    fn test_empty_date_is_now() {
        let before = Utc::now();
        let date = prompter("\n").prompt_date("When: ", DEFAULT_DATE_FORMAT).unwrap();
        assert!(date >= before && date <= Utc::now());
    }

    #[test]
    fn test_dns_names_until_empty() {
        let mut p = prompter("example.com\nwww.example.com\n\nignored\n");
        let names = p.prompt_dns_names().unwrap();
        assert_eq!(names, vec!["example.com", "www.example.com"]);

        let shown = String::from_utf8(p.output().clone()).unwrap();
        assert!(shown.contains("DNS.1 = "));
        assert!(shown.contains("DNS.3 = "));
    }

    #[test]
    fn test_end_of_input_stops() {
        assert!(prompter("").prompt_dns_names().unwrap().is_empty());
        assert_eq!(prompter("").prompt_string("x").unwrap(), "");
    }
}
