use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{DrawId, DrawRecord};

pub const HEADER: [&str; 9] = ["id", "date", "f1", "f2", "f3", "f4", "f5", "b1", "b2"];

const COLUMNS: usize = HEADER.len();

pub fn encode(records: &[DrawRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).context("Échec de l'écriture de l'en-tête")?;

    for record in records {
        let mut row = Vec::with_capacity(COLUMNS);
        row.push(record.id.to_string());
        row.push(record.date.clone());
        row.extend(record.front.iter().map(|n| n.to_string()));
        row.extend(record.back.iter().map(|n| n.to_string()));
        writer
            .write_record(&row)
            .with_context(|| format!("Échec de l'écriture du tirage {}", record.id))?;
    }

    let bytes = writer.into_inner().context("Échec du vidage du tampon CSV")?;
    String::from_utf8(bytes).context("Encodage UTF-8 invalide")
}

/// Décodage tolérant : l'en-tête, les lignes de commentaire (`#`) et toute
/// ligne mal formée sont ignorés. Les bornes des numéros ne sont pas vérifiées ici.
pub fn decode(text: &str) -> Vec<DrawRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!("ligne {} illisible : {}", line + 1, e);
                continue;
            }
        };
        if row.get(0) == Some(HEADER[0]) {
            continue;
        }
        match parse_row(&row) {
            Some(record) => records.push(record),
            None => debug!("ligne {} ignorée : {:?}", line + 1, row),
        }
    }
    records
}

fn parse_row(row: &csv::StringRecord) -> Option<DrawRecord> {
    if row.len() != COLUMNS {
        return None;
    }
    let number = |idx: usize| row.get(idx)?.parse::<u8>().ok();

    Some(DrawRecord {
        id: DrawId::parse(row.get(0)?).ok()?,
        date: row.get(1)?.to_string(),
        front: [number(2)?, number(3)?, number(4)?, number(5)?, number(6)?],
        back: [number(7)?, number(8)?],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{make_test_record, make_test_records};

    #[test]
    fn test_encode_layout() {
        let mut record = make_test_record("24001", [5, 1, 3, 2, 4], [12, 1]);
        record.date = "2024-01-01".to_string();
        let text = encode(&[record]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,date,f1,f2,f3,f4,f5,b1,b2");
        assert_eq!(lines[1], "24001,2024-01-01,5,1,3,2,4,12,1");
    }

    #[test]
    fn test_roundtrip() {
        let records = make_test_records(40);
        let decoded = decode(&encode(&records).unwrap());
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_decode_skips_malformed_lines() {
        let text = "id,date,f1,f2,f3,f4,f5,b1,b2\n\
                    24003,2024-01-06,1,2,3,4,5,1,2\n\
                    24002,2024-01-03,1,2,3,4,5,1\n\
                    abc,2024-01-03,1,2,3,4,5,1,2\n\
                    24001,2024-01-01,1,x,3,4,5,1,2\n\
                    24000,2023-12-30,1,2,3,4,5,1,2,9\n\
                    \n\
                    23999,2023-12-27,6,7,8,9,10,3,4\r\n";
        let records = decode(text);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["24003", "23999"]);
        assert_eq!(records[1].back, [3, 4]);
    }

    #[test]
    fn test_decode_skips_comments() {
        let text = "# Export du 2024-01-06, une ligne par tirage\n\
                    id,date,f1,f2,f3,f4,f5,b1,b2\n\
                    24003,2024-01-06,1,2,3,4,5,1,2\n";
        let records = decode(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "24003");
    }

    #[test]
    fn test_decode_does_not_check_ranges() {
        let records = decode("24001,2024-01-01,99,2,3,4,5,1,2\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].validate().is_err());
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode("").is_empty());
        assert!(decode("id,date,f1,f2,f3,f4,f5,b1,b2\n").is_empty());
    }
}
