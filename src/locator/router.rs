//! Routing of target URLs to locators

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::config::TargetRule;
use crate::error::ConfigError;
use crate::locator::types::{LocatorKind, TargetSpec, Variant};

#[derive(Debug, Clone)]
struct CompiledRule {
    host: String,
    path_prefix: Option<String>,
    locator: LocatorKind,
    link_pattern: Option<Regex>,
    app_name: Option<String>,
    variant: Option<Variant>,
}

impl CompiledRule {
    fn compile(rule: &TargetRule) -> Result<Self, ConfigError> {
        let link_pattern = rule
            .link_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        if rule.locator.needs_link_pattern() && link_pattern.is_none() {
            return Err(ConfigError::MissingLinkPattern {
                host: rule.host.clone(),
                locator: rule.locator.as_str(),
            });
        }

        Ok(Self {
            host: rule.host.trim().to_lowercase(),
            path_prefix: rule.path_prefix.clone(),
            locator: rule.locator,
            link_pattern,
            app_name: rule.app_name.clone(),
            variant: rule.variant,
        })
    }

    /// Exact host or any subdomain of it, plus the optional path prefix
    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str().map(str::to_lowercase) else {
            return false;
        };
        let host_matches = host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|rest| rest.ends_with('.'));

        host_matches
            && self
                .path_prefix
                .as_deref()
                .is_none_or(|prefix| url.path().starts_with(prefix))
    }
}

/// Decides which locator handles a target URL.
///
/// Rules are tried in order; URLs no rule matches are treated as listing
/// pages.
#[derive(Debug, Clone, Default)]
pub struct TargetRouter {
    rules: Vec<CompiledRule>,
}

impl TargetRouter {
    pub fn from_rules(rules: &[TargetRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn route(&self, url: Url) -> TargetSpec {
        let Some(rule) = self.rules.iter().find(|rule| rule.matches(&url)) else {
            debug!(url = %url, "No routing rule matched, using listing locator");
            return TargetSpec::new(url, LocatorKind::Listing);
        };
        debug!(url = %url, host = rule.host, locator = rule.locator.as_str(), "Routed target");

        let mut target = TargetSpec::new(url, rule.locator);
        target.link_pattern = rule.link_pattern.clone();
        target.app_name = rule.app_name.clone();
        target.variant = rule.variant;
        target
    }
}
