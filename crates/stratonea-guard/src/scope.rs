//! Render scope - tracks the component chain while a subtree is built

use crate::FaultOrigin;

/// Component chain for one build or update pass.
///
/// Entering a component pushes its name and leaving it pops it again. When a
/// component returns an error, the chain at that point is kept as the fault
/// site until a caller handles the error (by entering another component or
/// returning `Ok`). A panic unwinds past the pop and leaves the chain in
/// place.
#[derive(Debug, Default)]
pub struct RenderScope {
    chain: Vec<String>,
    fault_site: Option<Vec<String>>,
}

impl RenderScope {
    pub fn new() -> Self {
        RenderScope::default()
    }

    /// Build a named component inside this scope
    pub fn component<T, E>(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut RenderScope) -> Result<T, E>,
    ) -> Result<T, E> {
        self.fault_site = None;
        self.chain.push(name.to_owned());

        let result = build(self);
        if result.is_ok() {
            self.fault_site = None;
        } else if !self.propagating_inner_fault() {
            self.fault_site = Some(self.chain.clone());
        }

        self.chain.pop();
        result
    }

    /// Component names, outermost first
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Chain where the pending returned error left its component
    pub fn fault_site(&self) -> Option<&[String]> {
        self.fault_site.as_deref()
    }

    /// Format the fault chain innermost first, ending at the boundary
    pub(crate) fn trace(
        &self,
        boundary: &str,
        origin: FaultOrigin,
        detail: Option<&str>,
    ) -> String {
        let site = match origin {
            FaultOrigin::Returned => self.fault_site().unwrap_or(self.chain.as_slice()),
            FaultOrigin::Panicked => self.chain.as_slice(),
        };

        let mut lines = Vec::with_capacity(site.len() + 2);
        if let Some(detail) = detail {
            lines.push(detail.to_owned());
        }
        for name in site.iter().rev() {
            lines.push(format!("    in {}", name));
        }
        lines.push(format!("    in FaultBoundary({})", boundary));
        lines.join("\n")
    }

    /// The recorded site lies below the component being left
    fn propagating_inner_fault(&self) -> bool {
        self.fault_site
            .as_ref()
            .is_some_and(|site| site.len() > self.chain.len() && site.starts_with(&self.chain))
    }
}
