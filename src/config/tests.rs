use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let original_config = Config {
            ollama: OllamaConfig {
                protocol: "https".to_string(),
                host: "test-host".to_string(),
                port: 8080,
                embedding_model: "test-embed".to_string(),
                chat_model: "test-chat".to_string(),
                batch_size: 32,
                request_timeout_seconds: 30,
                retry_attempts: 2,
            },
            ..Config::default()
        };

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn override_dir_wins() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let dir = get_config_dir(Some(temp_dir.path())).expect("override should resolve");
        assert_eq!(dir, temp_dir.path());
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_field_type_rejected() {
        let invalid_toml = r#"
            [retrieval]
            top_k = "four"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [ollama]
            protocol = "http"
            host = "localhost"
            port = 11434
            embedding_model = "nomic-embed-text:latest"
            chat_model = "llama3.2:latest"
            batch_size = 64
            request_timeout_seconds = 90
            retry_attempts = 1

            [chunking]
            chunk_size = 800
            overlap = 100

            [retrieval]
            top_k = 5

            [answer]
            subject = "Jane Doe"
            temperature = 0.0
            max_tokens = 1024

            [document]
            path = "/srv/resume/jane_doe.txt"
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml successfully");
        assert!(config.validate().is_ok());
        assert_eq!(config.ollama.batch_size, 64);
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.answer.subject, "Jane Doe");
        assert_eq!(
            config.document_path(),
            std::path::PathBuf::from("/srv/resume/jane_doe.txt")
        );
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let config = OllamaConfig {
                protocol: protocol.to_string(),
                host: host.to_string(),
                port,
                ..OllamaConfig::default()
            };

            let url = config.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn empty_host_is_invalid() {
        let config = OllamaConfig {
            host: String::new(),
            port: 80,
            ..OllamaConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidOverlap(300, 200),
            ConfigError::InvalidTopK(0),
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(message.len() > 10);
        }
    }
}
