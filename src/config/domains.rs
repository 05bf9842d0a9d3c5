//! Production configuration domains.
//!
//! Plain data: every domain here is a literal tree of defaults and
//! environment references, resolved by [`crate::config::resolver`].

use crate::config::value::{
    concat, env, included_if, lit, map, non_empty, null, seq, slug, storage_path, ConfigDomain,
};

/// Capability gating the MySQL driver options.
pub const PDO_MYSQL: &str = "pdo_mysql";

/// Every capability a domain definition may test for.
pub const KNOWN_CAPABILITIES: &[&str] = &[PDO_MYSQL];

pub const DOMAIN_NAMES: &[&str] = &[
    "app",
    "database",
    "cache",
    "session",
    "queue",
    "mail",
    "logging",
    "filesystems",
];

/// All domains in declaration order.
pub fn all() -> Vec<ConfigDomain> {
    vec![app(), database(), cache(), session(), queue(), mail(), logging(), filesystems()]
}

/// Look up a domain definition by name.
pub fn by_name(name: &str) -> Option<ConfigDomain> {
    match name {
        "app" => Some(app()),
        "database" => Some(database()),
        "cache" => Some(cache()),
        "session" => Some(session()),
        "queue" => Some(queue()),
        "mail" => Some(mail()),
        "logging" => Some(logging()),
        "filesystems" => Some(filesystems()),
        _ => None,
    }
}

pub fn app() -> ConfigDomain {
    ConfigDomain::new(
        "app",
        [
            // Not a production override; shared by the cookie slug and page titles.
            ("name", env("APP_NAME").or("laravel").into()),
            ("env", lit("production")),
            ("debug", lit(false)),
            ("url", env("APP_URL").or("https://sischampions2022.com").into()),
            ("timezone", lit("UTC")),
            ("locale", lit("en")),
            ("fallback_locale", lit("en")),
            ("faker_locale", lit("en_US")),
            ("key", env("APP_KEY").into()),
            ("cipher", lit("AES-256-CBC")),
        ],
    )
}

pub fn database() -> ConfigDomain {
    ConfigDomain::new(
        "database",
        [
            ("default", lit("mysql")),
            (
                "connections",
                map([(
                    "mysql",
                    map([
                        ("driver", lit("mysql")),
                        ("host", env("DB_HOST").into()),
                        ("port", env("DB_PORT").or("3306").into()),
                        ("database", env("DB_DATABASE").into()),
                        ("username", env("DB_USERNAME").into()),
                        ("password", env("DB_PASSWORD").into()),
                        ("unix_socket", env("DB_SOCKET").or("").into()),
                        ("charset", lit("utf8mb4")),
                        ("collation", lit("utf8mb4_unicode_ci")),
                        ("prefix", lit("")),
                        ("prefix_indexes", lit(true)),
                        ("strict", lit(true)),
                        ("engine", null()),
                        (
                            "options",
                            map([(
                                "MYSQL_ATTR_SSL_CA",
                                included_if(PDO_MYSQL, non_empty(env("MYSQL_ATTR_SSL_CA"))),
                            )]),
                        ),
                    ]),
                )]),
            ),
        ],
    )
}

pub fn cache() -> ConfigDomain {
    ConfigDomain::new(
        "cache",
        [
            ("default", lit("file")),
            (
                "stores",
                map([(
                    "file",
                    map([
                        ("driver", lit("file")),
                        ("path", storage_path("framework/cache/data")),
                    ]),
                )]),
            ),
        ],
    )
}

pub fn session() -> ConfigDomain {
    ConfigDomain::new(
        "session",
        [
            ("driver", lit("file")),
            ("lifetime", env("SESSION_LIFETIME").or(120).int().into()),
            ("expire_on_close", lit(false)),
            ("encrypt", lit(false)),
            ("files", storage_path("framework/sessions")),
            ("connection", env("SESSION_CONNECTION").into()),
            ("table", lit("sessions")),
            ("store", env("SESSION_STORE").into()),
            ("lottery", seq([lit(2), lit(100)])),
            (
                "cookie",
                env("SESSION_COOKIE")
                    .or(concat([slug(env("APP_NAME").or("laravel"), '_'), lit("_session")]))
                    .into(),
            ),
            ("path", lit("/")),
            ("domain", env("SESSION_DOMAIN").into()),
            ("secure", lit(true)),
            ("http_only", lit(true)),
            ("same_site", lit("lax")),
        ],
    )
}

pub fn queue() -> ConfigDomain {
    ConfigDomain::new(
        "queue",
        [
            ("default", lit("database")),
            (
                "connections",
                map([(
                    "database",
                    map([
                        ("driver", lit("database")),
                        ("table", lit("jobs")),
                        ("queue", lit("default")),
                        ("retry_after", lit(90)),
                        ("after_commit", lit(false)),
                    ]),
                )]),
            ),
        ],
    )
}

pub fn mail() -> ConfigDomain {
    ConfigDomain::new(
        "mail",
        [
            ("default", env("MAIL_MAILER").or("smtp").into()),
            (
                "mailers",
                map([(
                    "smtp",
                    map([
                        ("transport", lit("smtp")),
                        ("host", env("MAIL_HOST").or("smtp.mailgun.org").into()),
                        ("port", env("MAIL_PORT").or(587).int().into()),
                        ("encryption", env("MAIL_ENCRYPTION").or("tls").into()),
                        ("username", env("MAIL_USERNAME").into()),
                        ("password", env("MAIL_PASSWORD").into()),
                        ("timeout", null()),
                        ("local_domain", env("MAIL_EHLO_DOMAIN").into()),
                    ]),
                )]),
            ),
            (
                "from",
                map([
                    ("address", env("MAIL_FROM_ADDRESS").or("hello@example.com").into()),
                    ("name", env("MAIL_FROM_NAME").or("Example").into()),
                ]),
            ),
        ],
    )
}

pub fn logging() -> ConfigDomain {
    ConfigDomain::new(
        "logging",
        [
            ("default", lit("stack")),
            (
                "deprecations",
                map([("channel", lit("null")), ("trace", lit(false))]),
            ),
            (
                "channels",
                map([
                    (
                        "stack",
                        map([
                            ("driver", lit("stack")),
                            ("channels", seq([lit("single")])),
                            ("ignore_exceptions", lit(false)),
                        ]),
                    ),
                    (
                        "single",
                        map([
                            ("driver", lit("single")),
                            ("path", storage_path("logs/laravel.log")),
                            ("level", env("LOG_LEVEL").or("debug").into()),
                        ]),
                    ),
                ]),
            ),
        ],
    )
}

pub fn filesystems() -> ConfigDomain {
    ConfigDomain::new(
        "filesystems",
        [
            ("default", env("FILESYSTEM_DISK").or("local").into()),
            (
                "disks",
                map([
                    (
                        "local",
                        map([
                            ("driver", lit("local")),
                            ("root", storage_path("app")),
                            ("throw", lit(false)),
                        ]),
                    ),
                    (
                        "public",
                        map([
                            ("driver", lit("local")),
                            ("root", storage_path("app/public")),
                            ("url", concat([env("APP_URL").into(), lit("/storage")])),
                            ("visibility", lit("public")),
                            ("throw", lit(false)),
                        ]),
                    ),
                    (
                        "s3",
                        map([
                            ("driver", lit("s3")),
                            ("key", env("AWS_ACCESS_KEY_ID").into()),
                            ("secret", env("AWS_SECRET_ACCESS_KEY").into()),
                            ("region", env("AWS_DEFAULT_REGION").into()),
                            ("bucket", env("AWS_BUCKET").into()),
                            ("url", env("AWS_URL").into()),
                            ("endpoint", env("AWS_ENDPOINT").into()),
                            (
                                "use_path_style_endpoint",
                                env("AWS_USE_PATH_STYLE_ENDPOINT").or(false).bool().into(),
                            ),
                            ("throw", lit(false)),
                        ]),
                    ),
                ]),
            ),
        ],
    )
}
