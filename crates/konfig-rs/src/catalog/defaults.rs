use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde_json::{Map, Value, json};

const SECRET_KEY_BYTES: usize = 32;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Random URL-safe secret, 32 bytes of entropy.
pub(crate) fn generate_secret_key() -> String {
    let mut bytes = [0u8; SECRET_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn application() -> Map<String, Value> {
    object(json!({
        "app_name": "Digital Product & PPOB Platform API",
        "app_version": "1.0.0",
        "debug": false,
        "environment": "production",
        "host": "0.0.0.0",
        "port": 8000,
        "workers": 4,
        "max_request_size": 16 * 1024 * 1024,
        "request_timeout": 30,
        "cors_enabled": true,
        "cors_origins": ["*"],
        "cors_methods": ["GET", "POST", "PUT", "DELETE", "OPTIONS"],
        "cors_headers": ["*"],
        "api_prefix": "/api/v1",
        "docs_url": "/docs",
        "redoc_url": "/redoc",
        "openapi_url": "/openapi.json",
        "timezone": "UTC",
        "locale": "en_US",
        "pagination_default_limit": 20,
        "pagination_max_limit": 100
    }))
}

pub(crate) fn database() -> Map<String, Value> {
    object(json!({
        "host": "localhost",
        "port": 5432,
        "pool_size": 10,
        "max_overflow": 20,
        "pool_timeout": 30,
        "ssl_mode": "disable"
    }))
}

pub(crate) fn cache() -> Map<String, Value> {
    object(json!({
        "backend": "memory",
        "host": "localhost",
        "port": 6379,
        "db": 0,
        "default_ttl": 3600,
        "max_connections": 10
    }))
}

pub(crate) fn security(secret_key: &str) -> Map<String, Value> {
    object(json!({
        "secret_key": secret_key,
        "jwt_algorithm": "HS256",
        "jwt_expiration": 3600,
        "password_min_length": 8,
        "password_require_uppercase": true,
        "password_require_lowercase": true,
        "password_require_numbers": true,
        "password_require_symbols": false,
        "max_login_attempts": 5,
        "lockout_duration": 900
    }))
}

pub(crate) fn logging() -> Map<String, Value> {
    object(json!({
        "level": "INFO",
        "format": "{timestamp} - {target} - {level} - {message}",
        "date_format": "%Y-%m-%d %H:%M:%S",
        "handlers": ["console", "file"],
        "console_handler": {
            "kind": "console",
            "level": "INFO",
            "formatter": "default"
        },
        "file_handler": {
            "kind": "rotating_file",
            "level": "DEBUG",
            "formatter": "detailed",
            "filename": "logs/app.log",
            "max_bytes": 10 * 1024 * 1024,
            "backup_count": 5
        },
        "loggers": {
            "hyper": {"level": "INFO"},
            "sqlx": {"level": "WARNING"},
            "redis": {"level": "WARNING"}
        },
        "disable_existing_loggers": false
    }))
}

pub(crate) fn payment() -> Map<String, Value> {
    object(json!({
        "default_gateway": "midtrans",
        "gateways": {
            "midtrans": {
                "enabled": true,
                "sandbox": true,
                "server_key": "",
                "client_key": "",
                "merchant_id": "",
                "timeout": 30,
                "notification_url": "/api/v1/payment/midtrans/notification",
                "return_url": "/payment/success",
                "error_url": "/payment/error"
            },
            "xendit": {
                "enabled": false,
                "sandbox": true,
                "secret_key": "",
                "public_key": "",
                "webhook_token": "",
                "timeout": 30,
                "callback_url": "/api/v1/payment/xendit/callback"
            },
            "doku": {
                "enabled": false,
                "sandbox": true,
                "mall_id": "",
                "shared_key": "",
                "timeout": 30,
                "notify_url": "/api/v1/payment/doku/notify"
            }
        },
        "auto_settlement": true,
        "settlement_delay": 24,
        "max_retry_attempts": 3,
        "retry_delay": 300,
        "supported_currencies": ["IDR"],
        "min_amount": 1000,
        "max_amount": 50_000_000
    }))
}

pub(crate) fn notification() -> Map<String, Value> {
    object(json!({
        "email": {
            "enabled": true,
            "provider": "smtp",
            "smtp": {
                "host": "localhost",
                "port": 587,
                "username": "",
                "password": "",
                "use_tls": true,
                "use_ssl": false,
                "timeout": 30
            },
            "from_email": "noreply@example.com",
            "from_name": "Digital Platform",
            "templates_dir": "templates/email",
            "max_retry_attempts": 3
        },
        "sms": {
            "enabled": true,
            "provider": "twilio",
            "twilio": {
                "account_sid": "",
                "auth_token": "",
                "from_number": ""
            },
            "max_retry_attempts": 3
        },
        "push": {
            "enabled": true,
            "provider": "firebase",
            "firebase": {
                "server_key": "",
                "project_id": ""
            },
            "max_retry_attempts": 3
        },
        "webhook": {
            "enabled": true,
            "timeout": 30,
            "max_retry_attempts": 3,
            "retry_delay": 60
        }
    }))
}

pub(crate) fn ppob() -> Map<String, Value> {
    object(json!({
        "providers": {
            "mobilepulsa": {
                "enabled": true,
                "api_key": "",
                "secret_key": "",
                "base_url": "https://api.mobilepulsa.net/v1",
                "timeout": 30,
                "max_retry_attempts": 3
            }
        },
        "categories": {
            "pulsa": {"enabled": true, "commission_rate": 0.05, "min_amount": 5000, "max_amount": 1_000_000},
            "data": {"enabled": true, "commission_rate": 0.03, "min_amount": 5000, "max_amount": 500_000},
            "pln": {"enabled": true, "commission_rate": 0.02, "min_amount": 20000, "max_amount": 5_000_000},
            "game": {"enabled": true, "commission_rate": 0.08, "min_amount": 5000, "max_amount": 2_000_000}
        },
        "auto_process": true,
        "process_delay": 5,
        "inquiry_timeout": 30,
        "transaction_timeout": 60,
        "status_check_interval": 30,
        "max_status_checks": 10
    }))
}

pub(crate) fn monitoring() -> Map<String, Value> {
    object(json!({
        "enabled": true,
        "metrics": {
            "enabled": true,
            "endpoint": "/metrics",
            "include_in_schema": false,
            "collect_default_metrics": true,
            "custom_metrics": {
                "request_duration": true,
                "request_count": true,
                "error_count": true,
                "active_connections": true
            }
        },
        "health_check": {
            "enabled": true,
            "endpoint": "/health",
            "include_in_schema": false,
            "checks": {
                "database": true,
                "cache": true,
                "external_apis": true,
                "disk_space": true,
                "memory_usage": true
            }
        },
        "alerting": {
            "enabled": true,
            "channels": {
                "email": {"enabled": true, "recipients": ["admin@example.com"]},
                "slack": {"enabled": false, "webhook_url": "", "channel": "#alerts"}
            },
            "rules": {
                "high_error_rate": {"threshold": 0.05, "window": 300, "severity": "critical"},
                "high_response_time": {"threshold": 2.0, "window": 300, "severity": "warning"},
                "low_disk_space": {"threshold": 0.1, "severity": "warning"}
            }
        },
        "tracing": {
            "enabled": false,
            "service_name": "digital-platform-api",
            "jaeger": {"agent_host": "localhost", "agent_port": 6831}
        }
    }))
}

pub(crate) fn rate_limit() -> Map<String, Value> {
    object(json!({
        "enabled": true,
        "storage": "redis",
        "default_limits": {
            "requests_per_minute": 60,
            "requests_per_hour": 1000,
            "requests_per_day": 10000
        },
        "endpoint_limits": {
            "/api/v1/auth/login": {"requests_per_minute": 5, "requests_per_hour": 20},
            "/api/v1/auth/register": {"requests_per_minute": 3, "requests_per_hour": 10},
            "/api/v1/payment/*": {"requests_per_minute": 30, "requests_per_hour": 500}
        },
        "user_type_limits": {
            "guest": {"requests_per_minute": 30, "requests_per_hour": 500},
            "user": {"requests_per_minute": 60, "requests_per_hour": 1000},
            "partner": {"requests_per_minute": 120, "requests_per_hour": 2000},
            "admin": {"requests_per_minute": 300, "requests_per_hour": 5000}
        },
        "whitelist_ips": [],
        "blacklist_ips": [],
        "headers": {
            "limit": "X-RateLimit-Limit",
            "remaining": "X-RateLimit-Remaining",
            "reset": "X-RateLimit-Reset"
        },
        "error_message": "Rate limit exceeded. Please try again later.",
        "error_status_code": 429
    }))
}

pub(crate) fn tasks() -> Map<String, Value> {
    object(json!({
        "broker": "redis",
        "backend": "redis",
        "redis": {
            "host": "localhost",
            "port": 6379,
            "db": 1,
            "password": null
        },
        "rabbitmq": {
            "host": "localhost",
            "port": 5672,
            "username": "guest",
            "password": "guest",
            "virtual_host": "/"
        },
        "worker": {
            "concurrency": 4,
            "max_tasks_per_child": 1000,
            "task_time_limit": 300,
            "task_soft_time_limit": 240
        },
        "beat": {
            "enabled": true,
            "schedule": {
                "cleanup_expired_sessions": {
                    "task": "maintenance.cleanup.session_cleanup",
                    "interval_secs": 3600
                },
                "update_exchange_rates": {
                    "task": "ppob.maintenance.price_update",
                    "interval_secs": 1800
                },
                "generate_daily_reports": {
                    "task": "reporting.financial.daily_report",
                    "at": {"hour": 1, "minute": 0}
                }
            }
        },
        "routes": {
            "email": "email_queue",
            "sms": "sms_queue",
            "push": "push_queue",
            "payment": "payment_queue",
            "ppob": "ppob_queue",
            "reports": "reports_queue"
        },
        "retry": {
            "max_retries": 3,
            "retry_delay": 60,
            "retry_backoff": true,
            "retry_jitter": true
        }
    }))
}
