//! # Status Reporting
//!
//! Every operator-facing line the engine prints is a [`StatusEvent`]; its
//! `Display` form is the exact line text without the trailing newline. A
//! [`Reporter`] decides where lines go: [`StdoutReporter`] for the binary,
//! [`MemoryReporter`] for tests.

use std::io::Write;

use uas_core::MacAddress;

/// One status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A configuration diagnostic.
    ConfigIssue { issue: String },
    /// Configuration rejected after all diagnostics were printed.
    ConfigRejected,
    /// Configuration accepted.
    ConfigVerified,
    /// Alias updates will only be simulated.
    DryRunEnabled,
    /// Number of sites taking part in the run.
    SitesFound { count: usize },
    /// Number of configured overrides.
    OverridesDefined { count: usize },
    /// One configured override.
    OverrideEntry { mac: MacAddress, alias: String },
    /// Client and aliased-client counts of one site.
    SiteClients {
        site: String,
        clients: usize,
        aliased: usize,
    },
    /// One aliased client discovered on a site.
    AliasedClient { mac: MacAddress, alias: String },
    /// A configured site exclusion.
    ExcludingSite { site: String },
    /// Start of one site's apply pass.
    AssigningSite { site: String },
    /// Dry-run intent.
    WouldSetAlias {
        mac: MacAddress,
        alias: String,
        previous: Option<String>,
    },
    /// Live update about to be sent.
    SettingAlias {
        mac: MacAddress,
        alias: String,
        previous: Option<String>,
    },
    /// Live update failed.
    ApplyFailed {
        mac: MacAddress,
        alias: String,
        reason: String,
    },
    /// Client already carries the resolved alias.
    AlreadyHasAlias { mac: MacAddress, alias: String },
    /// Client keeps a different alias because overwrites are off.
    NotOverwritten {
        mac: MacAddress,
        existing: String,
        resolved: String,
    },
    /// Number of aliases assigned on one site.
    ClientsAssigned { count: usize },
    /// Abort: the controller has no sites.
    NoSitesFound,
    /// Abort: one site and no overrides.
    SingleSite,
    /// Abort: nothing aliased anywhere and no overrides.
    NoAliasedClients,
    /// Abort: a controller call failed.
    ControllerFailed { reason: String },
    /// Run finished.
    Done,
}

impl std::fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigIssue { issue } => write!(f, "Error: {issue}"),
            Self::ConfigRejected => f.write_str("Terminating for invalid config file."),
            Self::ConfigVerified => {
                f.write_str("Environment and config file have been verified.")
            }
            Self::DryRunEnabled => {
                f.write_str("Dry run mode enabled; aliases won't actually get synchronized.")
            }
            Self::SitesFound { count } => write!(f, "Sites found: {count}"),
            Self::OverridesDefined { count } => {
                write!(f, "\tConfigured aliases: {count} client aliases defined.")
            }
            Self::OverrideEntry { mac, alias } => write!(f, "\t\t'{mac}' => '{alias}'"),
            Self::SiteClients {
                site,
                clients,
                aliased,
            } => write!(
                f,
                "\tSite {site} has {clients} clients, {aliased} of which are aliased."
            ),
            Self::AliasedClient { mac, alias } => write!(f, "\t\t\"{mac}\" => \"{alias}\""),
            Self::ExcludingSite { site } => write!(f, "Excluding site {site}"),
            Self::AssigningSite { site } => {
                write!(f, "About to assign client aliases to site {site}...")
            }
            Self::WouldSetAlias {
                mac,
                alias,
                previous,
            } => {
                write!(f, "\tWould have set alias for {mac} to \"{alias}\"")?;
                write_overwrite_suffix(f, previous.as_deref())
            }
            Self::SettingAlias {
                mac,
                alias,
                previous,
            } => {
                write!(f, "\tSetting alias for {mac} to \"{alias}\"")?;
                write_overwrite_suffix(f, previous.as_deref())
            }
            Self::ApplyFailed { mac, alias, reason } => write!(
                f,
                "\tWarning: Unable to set alias for {mac} to \"{alias}\" ({reason})."
            ),
            Self::AlreadyHasAlias { mac, alias } => {
                write!(f, "\tClient {mac} already has the alias \"{alias}\".")
            }
            Self::NotOverwritten {
                mac,
                existing,
                resolved,
            } => write!(
                f,
                "\tClient {mac} already aliased as \"{existing}\" (thus not getting aliased as \"{resolved}\")."
            ),
            Self::ClientsAssigned { count: 0 } => f.write_str("\tNo clients assigned an alias."),
            Self::ClientsAssigned { count } => {
                write!(f, "\tClients assigned an alias: {count}.")
            }
            Self::NoSitesFound => f.write_str("Error: No sites found."),
            Self::SingleSite => f.write_str(
                "Notice: Only one site found so there is no need to sync aliases across any other sites.",
            ),
            Self::NoAliasedClients => {
                f.write_str("Notice: There are no clients with an alias on any site.")
            }
            Self::ControllerFailed { reason } => write!(f, "Error: {reason}"),
            Self::Done => f.write_str("Done."),
        }
    }
}

fn write_overwrite_suffix(
    f: &mut std::fmt::Formatter<'_>,
    previous: Option<&str>,
) -> std::fmt::Result {
    match previous {
        Some(old) => write!(f, " (overwriting existing alias of \"{old}\")."),
        None => f.write_str("."),
    }
}

/// Sink for status lines.
pub trait Reporter {
    /// Emit one line.
    fn report(&mut self, event: &StatusEvent);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: &StatusEvent) {
        (**self).report(event);
    }
}

/// Writes lines to standard output unless disabled.
#[derive(Debug, Default)]
pub struct StdoutReporter {
    disabled: bool,
}

impl StdoutReporter {
    /// A reporter that prints every line.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that prints nothing when `disabled` is set.
    pub fn with_disabled(disabled: bool) -> Self {
        Self { disabled }
    }

    /// Switch output off (or back on) mid-run.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

impl Reporter for StdoutReporter {
    fn report(&mut self, event: &StatusEvent) {
        if self.disabled {
            return;
        }
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{event}") {
            tracing::warn!(error = %err, "failed to write status line");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    events: Vec<StatusEvent>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event reported so far.
    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    /// Every line reported so far.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// The full output, one newline-terminated line per event.
    pub fn output(&self) -> String {
        self.events.iter().map(|e| format!("{e}\n")).collect()
    }

    /// Forget everything reported so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, event: &StatusEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        MacAddress::new("90:04:e3:51:9d:a1").unwrap()
    }

    #[test]
    fn alias_lines() {
        let would = StatusEvent::WouldSetAlias {
            mac: mac(),
            alias: "Adam's iPhone 8".into(),
            previous: None,
        };
        assert_eq!(
            would.to_string(),
            "\tWould have set alias for 90:04:e3:51:9d:a1 to \"Adam's iPhone 8\"."
        );

        let setting = StatusEvent::SettingAlias {
            mac: mac(),
            alias: "Adam's iPhone 8".into(),
            previous: Some("iPhone 8 - Adam".into()),
        };
        assert_eq!(
            setting.to_string(),
            "\tSetting alias for 90:04:e3:51:9d:a1 to \"Adam's iPhone 8\" (overwriting existing alias of \"iPhone 8 - Adam\")."
        );
    }

    #[test]
    fn assigned_count_lines() {
        assert_eq!(
            StatusEvent::ClientsAssigned { count: 0 }.to_string(),
            "\tNo clients assigned an alias."
        );
        assert_eq!(
            StatusEvent::ClientsAssigned { count: 3 }.to_string(),
            "\tClients assigned an alias: 3."
        );
    }

    #[test]
    fn index_lines() {
        let site = StatusEvent::SiteClients {
            site: "default".into(),
            clients: 4,
            aliased: 3,
        };
        assert_eq!(
            site.to_string(),
            "\tSite default has 4 clients, 3 of which are aliased."
        );
        let entry = StatusEvent::OverrideEntry {
            mac: mac(),
            alias: "Phone".into(),
        };
        assert_eq!(entry.to_string(), "\t\t'90:04:e3:51:9d:a1' => 'Phone'");
    }

    #[test]
    fn memory_reporter_output_is_newline_terminated() {
        let mut reporter = MemoryReporter::new();
        reporter.report(&StatusEvent::SitesFound { count: 2 });
        reporter.report(&StatusEvent::Done);
        assert_eq!(reporter.output(), "Sites found: 2\nDone.\n");
        reporter.clear();
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn reporter_works_through_mutable_reference() {
        fn finish<R: Reporter>(mut reporter: R) {
            reporter.report(&StatusEvent::Done);
        }

        let mut inner = MemoryReporter::new();
        finish(&mut inner);
        assert_eq!(inner.lines(), vec!["Done."]);
    }
}
