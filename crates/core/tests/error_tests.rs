// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use trading_mate_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn invalid_file_format() {
        let err = CoreError::InvalidFileFormat("bad header".into());
        assert_eq!(err.to_string(), "Invalid file format: bad header");
    }

    #[test]
    fn unsupported_version() {
        let err = CoreError::UnsupportedVersion(99);
        assert_eq!(err.to_string(), "Unsupported file version: 99");
    }

    #[test]
    fn unsupported_version_max() {
        let err = CoreError::UnsupportedVersion(u16::MAX);
        assert_eq!(
            err.to_string(),
            format!("Unsupported file version: {}", u16::MAX)
        );
    }

    #[test]
    fn serialization() {
        let err = CoreError::Serialization("buffer overflow".into());
        assert_eq!(err.to_string(), "Serialization error: buffer overflow");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("unexpected EOF".into());
        assert_eq!(err.to_string(), "Deserialization error: unexpected EOF");
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO("permission denied".into());
        assert_eq!(err.to_string(), "File I/O error: permission denied");
    }

    #[test]
    fn configuration() {
        let err = CoreError::Configuration("missing key".into());
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn api_error() {
        let err = CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "API error (Alpha Vantage): rate limited");
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn validation_error() {
        let err = CoreError::ValidationError("quantity must be positive".into());
        assert_eq!(
            err.to_string(),
            "Trade validation failed: quantity must be positive"
        );
    }

    #[test]
    fn inconsistent_ledger() {
        let err = CoreError::InconsistentLedger {
            symbol: "ABC".into(),
            quantity: 15,
            held: 10,
            date: "05/01/2020".into(),
        };
        assert_eq!(
            err.to_string(),
            "Inconsistent ledger: cannot sell 15 ABC on 05/01/2020, only 10 held"
        );
    }

    #[test]
    fn empty_trade_log() {
        assert_eq!(CoreError::EmptyTradeLog.to_string(), "Trade log is empty");
    }

    #[test]
    fn refresh_stopped() {
        assert_eq!(
            CoreError::RefreshStopped.to_string(),
            "Price refresh task has been stopped"
        );
    }
}

// ── Debug trait ─────────────────────────────────────────────────────

mod debug_trait {
    use super::*;

    #[test]
    fn all_variants_are_debug() {
        let variants: Vec<CoreError> = vec![
            CoreError::InvalidFileFormat("test".into()),
            CoreError::UnsupportedVersion(1),
            CoreError::Serialization("test".into()),
            CoreError::Deserialization("test".into()),
            CoreError::FileIO("test".into()),
            CoreError::Configuration("test".into()),
            CoreError::Api {
                provider: "p".into(),
                message: "m".into(),
            },
            CoreError::Network("test".into()),
            CoreError::ValidationError("test".into()),
            CoreError::InconsistentLedger {
                symbol: "X".into(),
                quantity: 1,
                held: 0,
                date: "Z".into(),
            },
            CoreError::EmptyTradeLog,
            CoreError::RefreshStopped,
        ];

        for variant in &variants {
            let debug = format!("{:?}", variant);
            assert!(!debug.is_empty());
        }
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn from_io_error_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let core_err: CoreError = io_err.into();
        match &core_err {
            CoreError::FileIO(msg) => assert!(msg.contains("file not found")),
            other => panic!("Expected FileIO, got {:?}", other),
        }
    }

    #[test]
    fn from_io_error_preserves_message() {
        let msg = "custom IO error with special chars: ąść";
        let io_err = std::io::Error::other(msg);
        let core_err: CoreError = io_err.into();
        match &core_err {
            CoreError::FileIO(m) => assert!(m.contains(msg)),
            other => panic!("Expected FileIO, got {:?}", other),
        }
    }

    #[test]
    fn from_serde_json_error() {
        let result: Result<String, _> = serde_json::from_str("{{invalid json");
        let json_err = result.unwrap_err();
        let core_err: CoreError = json_err.into();
        match &core_err {
            CoreError::Deserialization(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Deserialization, got {:?}", other),
        }
    }

    #[test]
    fn from_serde_json_error_eof() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("");
        let core_err: CoreError = result.unwrap_err().into();
        match &core_err {
            CoreError::Deserialization(msg) => assert!(msg.contains("EOF")),
            other => panic!("Expected Deserialization, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn from_reqwest_error_redacts_query() {
        // Nothing listens on the discard port.
        let result = reqwest::Client::new()
            .get("http://127.0.0.1:9/query?function=X&apikey=SECRET123")
            .send()
            .await;
        let core_err: CoreError = result.unwrap_err().into();
        match &core_err {
            CoreError::Network(msg) => {
                assert!(!msg.contains("SECRET123"));
                assert!(!msg.contains("apikey"));
            }
            other => panic!("Expected Network, got {:?}", other),
        }
    }
}

// ── Error is std::error::Error ──────────────────────────────────────

mod std_error {
    use super::*;

    #[test]
    fn core_error_implements_error_trait() {
        let err: Box<dyn std::error::Error> =
            Box::new(CoreError::InvalidFileFormat("test".into()));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn core_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}

// ── Edge cases ──────────────────────────────────────────────────────

mod edge_cases {
    use super::*;

    #[test]
    fn unicode_in_error_message() {
        let err = CoreError::Api {
            provider: "日本API".into(),
            message: "接続エラー".into(),
        };
        assert_eq!(err.to_string(), "API error (日本API): 接続エラー");
    }

    #[test]
    fn newlines_in_error_message() {
        let err = CoreError::FileIO("line1\nline2\nline3".into());
        assert!(err.to_string().contains("line1\nline2\nline3"));
    }
}
