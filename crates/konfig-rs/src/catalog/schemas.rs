use konfig_rs_plugins::{FieldSchema, SchemaValidator, ValueKind};

const PORT_RANGE: (f64, f64) = (1.0, 65535.0);

fn string() -> FieldSchema {
    FieldSchema::of_kind(ValueKind::String)
}

fn integer() -> FieldSchema {
    FieldSchema::of_kind(ValueKind::Integer)
}

fn boolean() -> FieldSchema {
    FieldSchema::of_kind(ValueKind::Boolean)
}

fn port() -> FieldSchema {
    integer().range(PORT_RANGE.0, PORT_RANGE.1)
}

pub(crate) fn application() -> SchemaValidator {
    SchemaValidator::new()
        .with_field("app_name", string().required())
        .with_field("port", port())
        .with_field("workers", integer().range(1.0, 32.0))
        .with_field("debug", boolean())
}

pub(crate) fn database() -> SchemaValidator {
    SchemaValidator::new()
        .with_field("host", string().required())
        .with_field("port", port().required())
        .with_field("database", string().required())
        .with_field("username", string().required())
        .with_field("password", string().required())
        .with_field("pool_size", integer().range(1.0, 100.0))
        .with_field("max_overflow", integer().range(0.0, 50.0))
        .with_field("pool_timeout", integer().range(1.0, 300.0))
        .with_field(
            "ssl_mode",
            string().choices(["disable", "require", "verify-ca", "verify-full"]),
        )
}

pub(crate) fn cache() -> SchemaValidator {
    SchemaValidator::new()
        .with_field(
            "backend",
            string().required().choices(["memory", "redis", "memcached"]),
        )
        .with_field("host", string())
        .with_field("port", port())
        .with_field("password", string())
        .with_field("db", integer().range(0.0, 15.0))
        .with_field("default_ttl", integer().min(1.0))
        .with_field("max_connections", integer().range(1.0, 1000.0))
}

pub(crate) fn security() -> SchemaValidator {
    SchemaValidator::new()
        .with_field("secret_key", string().required())
        .with_field(
            "jwt_algorithm",
            string().choices(["HS256", "HS384", "HS512", "RS256"]),
        )
        .with_field("jwt_expiration", integer().range(60.0, 86400.0))
        .with_field("password_min_length", integer().range(6.0, 128.0))
        .with_field("password_require_uppercase", boolean())
        .with_field("password_require_lowercase", boolean())
        .with_field("password_require_numbers", boolean())
        .with_field("password_require_symbols", boolean())
        .with_field("max_login_attempts", integer().range(1.0, 10.0))
        .with_field("lockout_duration", integer().range(60.0, 3600.0))
}
