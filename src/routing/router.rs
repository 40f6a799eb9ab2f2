//! Route table with first-match-wins lookup.

use std::collections::HashMap;

use crate::routing::route::Route;

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route and return its index for later mutation.
    pub fn push(&mut self, route: Route) -> usize {
        self.routes.push(route);
        self.routes.len() - 1
    }

    pub fn route_mut(&mut self, index: usize) -> &mut Route {
        &mut self.routes[index]
    }

    /// Find the first route whose pattern matches `path`, in registration
    /// order, along with the captured parameters.
    pub fn find(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern().matches(path).map(|params| (route, params)))
    }

    /// Reverse a named route into a concrete path.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.routes
            .iter()
            .find(|route| route.name() == Some(name))
            .and_then(|route| route.pattern().reverse(params))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.routes.len()
    }
}
