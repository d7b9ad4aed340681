//! Operator guidance printed after a successful migration.

use crate::config::HarmonyDbConfig;

/// Binary the follow-up commands refer to
pub const PROVIDER_BIN: &str = "./lotus-provider";

/// Command-line overrides for every HarmonyDB setting that differs from the
/// compiled-in defaults, each with a leading space.
pub fn db_override_flags(actual: &HarmonyDbConfig, defaults: &HarmonyDbConfig) -> String {
    let mut flags = Vec::new();
    if actual.hosts != defaults.hosts {
        flags.push(format!(" --db-host=\"{}\"", actual.hosts.join(",")));
    }
    if actual.port != defaults.port {
        flags.push(format!(" --db-port={}", actual.port));
    }
    if actual.username != defaults.username {
        flags.push(format!(" --db-user=\"{}\"", actual.username));
    }
    if actual.password != defaults.password {
        flags.push(format!(" --db-password=\"{}\"", actual.password));
    }
    if actual.database != defaults.database {
        flags.push(format!(" --db-name=\"{}\"", actual.database));
    }
    flags.concat()
}

/// Full message for a created layer: creation notice, the translator's
/// advisory, then ready-to-copy commands.
pub fn follow_up_message(
    layer: &str,
    advisory: &str,
    actual: &HarmonyDbConfig,
    defaults: &HarmonyDbConfig,
) -> String {
    let db = db_override_flags(actual, defaults);
    format!(
        "Layer {layer} created. {advisory}\n\
         To work with the config:\n\
         {PROVIDER_BIN} {db} config help \n\
         To run Lotus Provider: in its own machine or cgroup without other files, use the command: \n\
         {PROVIDER_BIN} {db} run --layers=\"{layer}\"\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_port_differs() {
        let defaults = HarmonyDbConfig::default();
        let actual = HarmonyDbConfig {
            port: "5432".to_string(),
            ..Default::default()
        };
        let flags = db_override_flags(&actual, &defaults);
        assert_eq!(flags, " --db-port=5432");

        let msg = follow_up_message("mig0", "", &actual, &defaults);
        assert!(msg.contains(" --db-port=5432"));
        for absent in ["--db-host", "--db-user", "--db-password", "--db-name"] {
            assert!(!msg.contains(absent));
        }
    }

    #[test]
    fn quoted_fields_and_host_list() {
        let defaults = HarmonyDbConfig::default();
        let actual = HarmonyDbConfig {
            hosts: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            username: "admin".into(),
            password: "p@ss word".into(),
            database: "layers".into(),
            ..Default::default()
        };
        assert_eq!(
            db_override_flags(&actual, &defaults),
            " --db-host=\"10.0.0.1,10.0.0.2\" --db-user=\"admin\" --db-password=\"p@ss word\" --db-name=\"layers\""
        );
    }

    #[test]
    fn defaults_produce_no_overrides() {
        let d = HarmonyDbConfig::default();
        assert!(db_override_flags(&d, &d).is_empty());
    }

    #[test]
    fn message_is_deterministic_and_names_layer() {
        let defaults = HarmonyDbConfig::default();
        let actual = HarmonyDbConfig {
            database: "other".into(),
            ..Default::default()
        };
        let a = follow_up_message("prod", "advice\n", &actual, &defaults);
        let b = follow_up_message("prod", "advice\n", &actual, &defaults);
        assert_eq!(a, b);
        assert!(a.starts_with("Layer prod created. advice\n"));
        assert!(a.contains("run --layers=\"prod\""));
        assert!(a.contains(" --db-name=\"other\" config help"));
    }
}
