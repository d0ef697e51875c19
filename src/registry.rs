//! Route table: resources registered explicitly at startup, matched by route name.

use crate::error::ConfigError;
use crate::handlers::controller::{Controller, DefaultController};
use crate::resource::Resource;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// One optional trailing segment, no further separators.
const WILDCARD: &str = "/([^/]+)?";

struct Route {
    name: String,
    wildcard: Regex,
    controller: Arc<dyn Controller>,
}

/// Result of resolving a path: the controller and the captured trailing segment, if any.
pub struct RouteMatch<'a> {
    pub controller: &'a dyn Controller,
    pub captured: Option<String>,
}

#[derive(Default)]
pub struct Registry {
    routes: Vec<Route>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { routes: Vec::new() }
    }

    /// Register a controller under its resource's route name.
    pub fn register<C>(&mut self, controller: C) -> Result<&mut Self, ConfigError>
    where
        C: Controller + 'static,
    {
        let name = controller.resource().route().to_string();
        if self.routes.iter().any(|r| r.name == name) {
            return Err(ConfigError::DuplicateRoute(name));
        }
        let wildcard = RegexBuilder::new(&format!("^{}{}$", regex::escape(&name), WILDCARD))
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidResource(format!("route {}: {}", name, e)))?;
        tracing::debug!(route = %name, table = %controller.resource().table(), "registered resource");
        self.routes.push(Route {
            name,
            wildcard,
            controller: Arc::new(controller),
        });
        Ok(self)
    }

    /// Register a resource with the default controller.
    pub fn register_resource(&mut self, resource: Resource) -> Result<&mut Self, ConfigError> {
        self.register(DefaultController::new(resource))
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve a path with surrounding separators already trimmed. Each route is tried in
    /// registration order: exact case-insensitive match first, then the wildcard.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        for route in &self.routes {
            if route.name.eq_ignore_ascii_case(path) {
                return Some(RouteMatch {
                    controller: route.controller.as_ref(),
                    captured: None,
                });
            }
            if let Some(caps) = route.wildcard.captures(path) {
                return Some(RouteMatch {
                    controller: route.controller.as_ref(),
                    captured: caps.get(1).map(|m| m.as_str().to_string()),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_resource(Resource::builder("ThingsResource").build().unwrap())
            .unwrap()
            .register_resource(Resource::builder("ConstructionStagesResource").build().unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let r = registry();
        let m = r.resolve("Things").unwrap();
        assert_eq!(m.controller.resource().route(), "things");
        assert!(m.captured.is_none());

        let m = r.resolve("ConstructionStages").unwrap();
        assert_eq!(m.controller.resource().table(), "construction_stages");
    }

    #[test]
    fn wildcard_captures_one_trailing_segment() {
        let r = registry();
        let m = r.resolve("things/7").unwrap();
        assert_eq!(m.controller.resource().route(), "things");
        assert_eq!(m.captured.as_deref(), Some("7"));

        let m = r.resolve("THINGS/abc").unwrap();
        assert_eq!(m.captured.as_deref(), Some("abc"));
    }

    #[test]
    fn unknown_or_deeper_paths_do_not_match() {
        let r = registry();
        assert!(r.resolve("nope").is_none());
        assert!(r.resolve("things/7/extra").is_none());
        assert!(r.resolve("thingsx").is_none());
        assert!(r.resolve("").is_none());
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let mut r = registry();
        let err = r
            .register_resource(Resource::builder("ThingsModel").build().unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::DuplicateRoute(name) if name == "things"));
        assert_eq!(r.route_names().collect::<Vec<_>>(), vec!["things", "constructionstages"]);
    }
}
