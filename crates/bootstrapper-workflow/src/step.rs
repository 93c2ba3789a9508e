//! Step definitions.

use bootstrapper_catalog::CatalogIndex;

use crate::field::FieldSpec;
use crate::store::WorkflowStore;

/// Additional fields computed from the answers so far and the catalog.
pub type FieldResolver = fn(&WorkflowStore, &CatalogIndex) -> Vec<FieldSpec>;

/// Next step id from the answers so far.
pub type Transition = fn(&WorkflowStore) -> &'static str;

/// Side effect run after answers are merged and before the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    None,
    /// Normalize cloud storage answers.
    NormalizeCloud,
    /// Log in to Panorama and fetch a VM auth key.
    EnrollPanorama,
    /// Record the bootstrap template choice.
    SelectTemplate,
    /// Render and encode the chosen bootstrap template.
    RenderBootstrap,
    /// Fetch a dynamic content package.
    DownloadContent,
    /// Compile every artifact and submit the package.
    ShipPackage,
}

/// One wizard step.
#[derive(Debug, Clone)]
pub struct WorkflowStep {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub resolver: Option<FieldResolver>,
    pub action: StepAction,
    /// `None` marks the terminal step.
    pub transition: Option<Transition>,
}

impl WorkflowStep {
    pub fn new(id: &'static str, title: &'static str) -> Self {
        Self {
            id,
            title,
            fields: Vec::new(),
            resolver: None,
            action: StepAction::None,
            transition: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.action = action;
        self
    }

    pub fn then(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.transition.is_none()
    }

    /// Static fields followed by resolved ones.
    pub fn fields_for(&self, store: &WorkflowStore, index: &CatalogIndex) -> Vec<FieldSpec> {
        let mut fields = self.fields.clone();
        if let Some(resolve) = self.resolver {
            fields.extend(resolve(store, index));
        }
        fields
    }
}
