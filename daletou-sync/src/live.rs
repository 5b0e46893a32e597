//! Lecture du rapport HTML des tirages et client HTTP associé.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use daletou_db::models::{DrawId, DrawRecord};

use crate::error::FetchError;

/// Marqueur des lignes de tirage dans le rapport.
pub const ROW_SELECTOR: &str = "tr.t_tr1";

const MIN_CELLS: usize = 9;

/// Accès réseau derrière l'échelle de repli : une requête GET, corps en texte.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("daletou/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            timeout_secs: timeout.as_secs(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { secs: self.timeout_secs }
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Extrait les tirages du rapport : cellule 0 = période, 1-5 = zone avant,
/// 6-7 = zone arrière, date = dernière cellule au format AAAA-MM-JJ.
pub fn parse_report(html: &str) -> Vec<DrawRecord> {
    let document = Html::parse_document(html);
    let (Ok(rows), Ok(cells)) = (Selector::parse(ROW_SELECTOR), Selector::parse("td")) else {
        return Vec::new();
    };

    document
        .select(&rows)
        .filter_map(|row| {
            let record = parse_row(row, &cells);
            if record.is_none() {
                debug!("Ligne ignorée : {}", row.text().collect::<String>().trim());
            }
            record
        })
        .collect()
}

fn parse_row(row: ElementRef<'_>, cells: &Selector) -> Option<DrawRecord> {
    let texts: Vec<String> = row
        .select(cells)
        .map(|td| td.text().collect::<String>().trim().to_string())
        .collect();
    if texts.len() < MIN_CELLS {
        return None;
    }

    let number = |idx: usize| texts[idx].parse::<u8>().ok();
    let date = texts.iter().rev().find(|t| is_iso_date(t))?;

    Some(DrawRecord {
        id: DrawId::parse(&texts[0]).ok()?,
        date: date.clone(),
        front: [number(1)?, number(2)?, number(3)?, number(4)?, number(5)?],
        back: [number(6)?, number(7)?],
    })
}

fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Caractères laissés tels quels par `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

pub fn relay_url(relay: &str, target: &str) -> String {
    format!("{relay}{}", encode_component(target))
}

#[cfg(test)]
pub(crate) fn render_report(records: &[DrawRecord]) -> String {
    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr class=\"t_tr1\"><td>{}</td><td class=\"cfont2\">{:02}</td><td class=\"cfont2\">{:02}</td>\
                 <td class=\"cfont2\">{:02}</td><td class=\"cfont2\">{:02}</td><td class=\"cfont2\">{:02}</td>\
                 <td class=\"cfont4\">{:02}</td><td class=\"cfont4\">{:02}</td><td>1</td><td>10,000,000</td>\
                 <td>{}</td></tr>\n",
                r.id, r.front[0], r.front[1], r.front[2], r.front[3], r.front[4], r.back[0], r.back[1], r.date
            )
        })
        .collect();
    format!(
        "<html><body><table><tbody id=\"tdata\">\n<tr class=\"t_tr0\"><td>期号</td></tr>\n{rows}</tbody></table></body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use daletou_db::models::make_test_records;

    #[test]
    fn test_parse_report_rows() {
        let records = make_test_records(12);
        let parsed = parse_report(&render_report(&records));
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_parse_report_takes_last_date() {
        let html = r#"<table>
            <tr class="t_tr1"><td>24001</td><td>01</td><td>02</td><td>03</td><td>04</td><td>05</td>
            <td>06</td><td>07</td><td>2023-12-31</td><td>n/a</td><td>2024-01-01</td><td>x</td></tr>
        </table>"#;
        let parsed = parse_report(html);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].date, "2024-01-01");
        assert_eq!(parsed[0].front, [1, 2, 3, 4, 5]);
        assert_eq!(parsed[0].back, [6, 7]);
    }

    #[test]
    fn test_parse_report_skips_incomplete_rows() {
        let html = r#"<table>
            <tr class="t_tr1"><td>24003</td><td>01</td><td>02</td><td>03</td><td>04</td><td>05</td><td>06</td><td>07</td></tr>
            <tr class="t_tr1"><td>24002</td><td>01</td><td>02</td><td>03</td><td>04</td><td>05</td><td>06</td><td>07</td><td>pas de date</td></tr>
            <tr class="t_tr1"><td></td><td>01</td><td>02</td><td>03</td><td>04</td><td>05</td><td>06</td><td>07</td><td>2024-01-03</td></tr>
            <tr class="other"><td>24001</td><td>01</td><td>02</td><td>03</td><td>04</td><td>05</td><td>06</td><td>07</td><td>2024-01-01</td></tr>
        </table>"#;
        assert!(parse_report(html).is_empty());
    }

    #[test]
    fn test_parse_report_garbage() {
        assert!(parse_report("").is_empty());
        assert!(parse_report("<<<not html").is_empty());
    }

    #[test]
    fn test_is_iso_date() {
        assert!(is_iso_date("2024-02-29"));
        assert!(!is_iso_date("2024-2-29"));
        assert!(!is_iso_date("24/02/2024"));
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("a b/c?d=e&f"), "a%20b%2Fc%3Fd%3De%26f");
        assert_eq!(encode_component("期号"), "%E6%9C%9F%E5%8F%B7");
    }

    #[test]
    fn test_relay_url() {
        let url = relay_url(
            "https://api.allorigins.win/raw?url=",
            "https://datachart.500.com/dlt/history/newinc/history.php?limit=100&sort=0",
        );
        assert_eq!(
            url,
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fdatachart.500.com%2Fdlt%2Fhistory%2Fnewinc%2Fhistory.php%3Flimit%3D100%26sort%3D0"
        );
    }
}
