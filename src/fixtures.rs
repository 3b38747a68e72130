#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use confique::Config;
    use serde::{Deserialize, Serialize};

    use crate::schema::{Schema, SchemaBuilder};

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Database settings.
        #[config(nested)]
        pub database: TestDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestDbConfig {
        /// Connection string URL.
        #[config(default = "postgres://localhost/app")]
        pub url: String,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: u32,
    }

    /// The schema derived from [`TestConfig`].
    pub fn test_schema() -> Arc<Schema> {
        let builder = SchemaBuilder::from_config::<TestConfig>().unwrap();
        Arc::new(builder.build())
    }

    #[test]
    fn test_config_loads_defaults() {
        let config = TestConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, "postgres://localhost/app");
        assert_eq!(config.database.pool_size, 5);
    }

    // -- Fixtures for schema derivation failures -------------------------------

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct OptionalConfig {
        /// No default, so it cannot become a schema entry.
        pub token: Option<String>,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct RequiredConfig {
        #[config(default = "app")]
        pub name: String,

        #[config(nested)]
        pub auth: AuthConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct AuthConfig {
        /// Required, with no default.
        pub secret: String,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct ListConfig {
        #[config(default = ["a", "b"])]
        pub tags: Vec<String>,
    }
}
