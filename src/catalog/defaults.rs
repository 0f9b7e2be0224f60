//! Built-in approved versions (standard ES0901 v4.7).

/// Reference standard the built-in table is taken from.
pub const STANDARD_REFERENCE: &str = "ES0901 v4.7";

/// When the built-in table was last reviewed.
pub const STANDARD_UPDATED: &str = "January 2025";

/// Recommendation shown when software is absent from the catalog.
pub const STANDARD_HINT: &str = "Check standard ES0901 for approved software";

pub(crate) const DEFAULT_ENTRIES: &[(&str, &[&str])] = &[
    // Languages
    ("php", &["8.1.30", "8.2.24"]),
    ("python", &["3.9.18", "3.11.7", "3.12.1"]),
    ("java", &["11.0.25", "17.0.13", "21.0.5"]),
    ("openjdk", &["11.0.25", "17.0.13", "21.0.5"]),
    ("nodejs", &["18.20.4", "20.16.0"]),
    ("node", &["18.20.4", "20.16.0"]),
    // Frontend frameworks
    ("angular", &["17.3.12", "18.2.6"]),
    ("react", &["18.0.0", "18.1.0", "18.2.0"]),
    ("vue", &["3.3.0", "3.4.0"]),
    ("nextjs", &["14.1"]),
    ("next", &["14.1"]),
    // Backend frameworks
    ("nestjs", &["9.4.0", "10.0.0"]),
    ("django", &["4.2.16", "5.0.9", "5.1.1"]),
    ("laravel", &["10.21.1", "11.4.0"]),
    ("express", &["4.19.2"]),
    ("fastify", &["4.28.1", "5.0.0"]),
    ("spring", &["3.2.10", "3.3.4"]),
    ("springboot", &["3.2.10", "3.3.4"]),
    // JavaScript libraries
    ("jquery", &["3.6.4", "3.7.0", "3.7.1"]),
    ("bootstrap", &["5.3.0", "5.3.1", "5.3.2"]),
    ("chart.js", &["4.3.0", "4.4.0"]),
    ("chartjs", &["4.3.0", "4.4.0"]),
    ("highcharts", &["10.3.3", "11.4.0"]),
    ("moment", &["2.30.0"]),
    ("lodash", &["4.17.21"]),
    ("underscore", &["1.13.6"]),
    // CSS / design
    ("obelisco", &["2.0.0"]),
    ("font-awesome", &["6.0.0", "6.1.0", "6.2.0"]),
    ("fontawesome", &["6.0.0", "6.1.0", "6.2.0"]),
    // Databases
    ("oracle", &["19c"]),
    ("postgresql", &["13.16", "15.8", "16.4"]),
    ("postgres", &["13.16", "15.8", "16.4"]),
    ("mariadb", &["10.5.26"]),
    ("mongodb", &["6.0.16", "7.3.3"]),
    ("redis", &["7.2.4", "7.4.0"]),
    // Web servers
    ("apache", &["2.4.57"]),
    ("nginx", &["1.24.0"]),
    ("tomcat", &["10.1.25"]),
    // Operating systems
    ("rhel", &["8.7"]),
    ("redhat", &["8.7"]),
    ("android", &["9.0", "10.0", "11.0", "12.0", "13.0", "14.0"]),
    ("ios", &["15.0", "16.0", "17.0"]),
    // Tooling
    ("openssl", &["1.1.1", "3.0.13", "3.1.15"]),
    ("docker", &["20.10.0", "24.0.0"]),
    ("kubernetes", &["1.28.0", "1.29.0"]),
];

/// Display grouping used by the catalog summary.
pub(crate) const CATEGORIES: &[(&str, &[&str])] = &[
    ("languages", &["php", "python", "java", "nodejs"]),
    ("frontend_frameworks", &["angular", "react", "vue", "nextjs"]),
    (
        "backend_frameworks",
        &["nestjs", "django", "laravel", "express", "spring"],
    ),
    (
        "databases",
        &["oracle", "postgresql", "mariadb", "mongodb", "redis"],
    ),
    ("web_servers", &["apache", "nginx", "tomcat"]),
    ("js_libraries", &["jquery", "bootstrap", "chart.js", "moment"]),
    ("operating_systems", &["rhel", "android", "ios"]),
];
