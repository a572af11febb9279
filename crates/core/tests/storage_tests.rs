// ═══════════════════════════════════════════════════════════════════
// Storage Tests — trade log file format, DatabaseHandler
// ═══════════════════════════════════════════════════════════════════

use std::path::PathBuf;

use trading_mate_core::errors::CoreError;
use trading_mate_core::models::trade::{Trade, TradeRecord};
use trading_mate_core::storage::database::DatabaseHandler;
use trading_mate_core::storage::format::{self, CURRENT_VERSION};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn sample_records() -> Vec<TradeRecord> {
    vec![
        Trade::create("01/02/2019", "DEPOSIT", 1000, "", 0.0, 0.0, 0.0)
            .unwrap()
            .to_record(),
        Trade::create("03/02/2019", "BUY", 250, "mktx", 4.0314, 6.0, 5.04)
            .unwrap()
            .to_record(),
        Trade::create("10/06/2019", "SELL", 100, "MKTX", 4.9, 6.0, 0.0)
            .unwrap()
            .to_record(),
    ]
}

const LEGACY_FILE: &str = r#"{
  "trades": [
    {"date": "21/03/2019", "action": "DEPOSIT", "amount": 500, "symbol": "", "price": 0.0, "fee": 0.0, "stamp_duty": 0.0},
    {"date": "22/03/2019", "action": "BUY", "amount": 10, "symbol": "LLOY.L", "price": 61.5, "fee": 6.0, "stamp_duty": 3.08}
  ]
}"#;

// ═══════════════════════════════════════════════════════════════════
// File format
// ═══════════════════════════════════════════════════════════════════

mod file_format {
    use super::*;

    #[test]
    fn current_version_is_one() {
        assert_eq!(CURRENT_VERSION, 1);
    }

    #[test]
    fn write_then_read_preserves_order() {
        let records = sample_records();
        let bytes = format::write_file(&records).unwrap();
        let back = format::read_file(&bytes).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn written_file_is_versioned_json() {
        let bytes = format::write_file(&sample_records()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["trades"].as_array().unwrap().len(), 3);
        assert_eq!(value["trades"][1]["symbol"], "MKTX");
        assert_eq!(value["trades"][1]["action"], "BUY");
        assert_eq!(value["trades"][0]["date"], "01/02/2019");
    }

    #[test]
    fn empty_log_round_trips() {
        let bytes = format::write_file(&[]).unwrap();
        assert!(format::read_file(&bytes).unwrap().is_empty());
    }

    #[test]
    fn missing_version_is_accepted() {
        let records = format::read_file(LEGACY_FILE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].quantity, 10);
        assert_eq!(records[1].symbol, "LLOY.L");
    }

    #[test]
    fn empty_file_rejected() {
        for data in [&b""[..], &b"  \n\t"[..]] {
            match format::read_file(data) {
                Err(CoreError::InvalidFileFormat(msg)) => assert!(msg.contains("empty")),
                other => panic!("Expected InvalidFileFormat, got {:?}", other),
            }
        }
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            format::read_file(b"not json at all"),
            Err(CoreError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn wrong_shape_rejected() {
        assert!(matches!(
            format::read_file(br#"{"version": 1}"#),
            Err(CoreError::InvalidFileFormat(_))
        ));
        assert!(matches!(
            format::read_file(br#"[1, 2, 3]"#),
            Err(CoreError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn record_with_missing_key_is_validation_error() {
        let data = br#"{"version": 1, "trades": [{"date": "01/01/2020", "action": "BUY"}]}"#;
        assert!(matches!(
            format::read_file(data),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn record_with_mistyped_key_is_validation_error() {
        let data = br#"{"version": 1, "trades": [
            {"date": "01/01/2020", "action": "BUY", "quantity": 1, "symbol": "A", "price": 1.0, "fee": 0.0, "stamp_duty": 0.0},
            {"date": "02/01/2020", "action": "BUY", "quantity": 1, "symbol": "A", "price": "cheap", "fee": 0.0, "stamp_duty": 0.0}
        ]}"#;
        match format::read_file(data) {
            Err(CoreError::ValidationError(msg)) => assert!(msg.contains("record 2")),
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_version_checked_before_records() {
        let data = br#"{"version": 7, "trades": [{"date": "01/01/2020"}]}"#;
        assert!(matches!(
            format::read_file(data),
            Err(CoreError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn future_version_rejected() {
        let data = br#"{"version": 2, "trades": []}"#;
        assert!(matches!(
            format::read_file(data),
            Err(CoreError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn version_zero_rejected() {
        let data = br#"{"version": 0, "trades": []}"#;
        assert!(matches!(
            format::read_file(data),
            Err(CoreError::UnsupportedVersion(0))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// DatabaseHandler
// ═══════════════════════════════════════════════════════════════════

mod database_handler {
    use super::*;

    #[test]
    fn remembers_initial_path() {
        let db = DatabaseHandler::new("/tmp/some/log.json");
        assert_eq!(db.db_filepath(), PathBuf::from("/tmp/some/log.json").as_path());
    }

    #[test]
    fn write_creates_directories_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/trading_log.json");
        let mut db = DatabaseHandler::new(&path);

        db.write_data(None, &sample_records()).unwrap();
        assert!(path.exists());

        let records = db.read_data(None).unwrap();
        assert_eq!(records, sample_records());
    }

    #[test]
    fn read_trades_validates_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut db = DatabaseHandler::new(&path);
        db.write_data(None, &sample_records()).unwrap();

        let trades = db.read_trades(None).unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[1].symbol(), Some("MKTX"));
        assert_eq!(trades[1].quantity(), 250);
        assert_eq!(trades[1].stamp_duty(), 5.04);
    }

    #[test]
    fn read_trades_rejects_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "trades": [{"date": "31/02/2019", "action": "BUY", "quantity": 1, "symbol": "X", "price": 1.0, "fee": 0.0, "stamp_duty": 0.0}]}"#,
        )
        .unwrap();

        let mut db = DatabaseHandler::new(&path);
        assert!(matches!(
            db.read_trades(None),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn write_to_other_path_switches_current_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        let mut db = DatabaseHandler::new(&first);

        db.write_data(Some(&second), &sample_records()).unwrap();
        assert_eq!(db.db_filepath(), second.as_path());
        assert!(!first.exists());
    }

    #[test]
    fn read_from_other_path_switches_current_file() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("legacy.json");
        std::fs::write(&other, LEGACY_FILE).unwrap();

        let mut db = DatabaseHandler::new(dir.path().join("default.json"));
        let records = db.read_data(Some(&other)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(db.db_filepath(), other.as_path());
    }

    #[test]
    fn failed_read_keeps_current_path() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.json");
        let mut db = DatabaseHandler::new(&current);

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            db.read_data(Some(&missing)),
            Err(CoreError::FileIO(_))
        ));
        assert_eq!(db.db_filepath(), current.as_path());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert!(db.read_data(Some(&broken)).is_err());
        assert_eq!(db.db_filepath(), current.as_path());
    }

    #[test]
    fn overwrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut db = DatabaseHandler::new(&path);

        db.write_data(None, &sample_records()).unwrap();
        db.write_data(None, &sample_records()[..1]).unwrap();
        assert_eq!(db.read_data(None).unwrap().len(), 1);
    }
}
