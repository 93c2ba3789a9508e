//! The bootstrap package wizard.
//!
//! Every transition here is a pure function of the store. Unset keys take
//! the defaults written next to each `get_or` call.

use bootstrapper_catalog::{CatalogIndex, RESERVED_TEMPLATE_NAMES};

use crate::field::{Choice, FieldKind, FieldSpec, yes_no};
use crate::step::{StepAction, WorkflowStep};
use crate::store::WorkflowStore;

pub const START: &str = "start";
pub const CLOUD_AUTH: &str = "cloud_auth";
pub const PANORAMA_CONFIG: &str = "panorama_config";
pub const CHOOSE_TEMPLATE: &str = "choose_template";
pub const CONFIGURE_TEMPLATE: &str = "configure_template";
pub const UPLOAD_TEMPLATE: &str = "upload_template";
pub const INCLUDE_CONTENT: &str = "include_content";
pub const DOWNLOAD_CONTENT: &str = "download_content";
pub const CONFIGURE_MANAGEMENT: &str = "configure_management";
pub const CONFIGURE_MANAGEMENT_STATIC: &str = "configure_management_static";
pub const COMPLETE: &str = "complete";

/// Store namespace for this workflow.
pub const NAMESPACE: &str = "bootstrapper";

/// Chooser sentinels.
pub const CHOICE_NONE: &str = "none";
pub const CHOICE_UPLOAD: &str = "upload";
/// Built-in template offered as "Use Default Bootstrap".
pub const DEFAULT_BOOTSTRAP_TEMPLATE: &str = "bootstrap_xml";

/// Label selecting full-device configuration templates.
pub const TEMPLATE_CATEGORY: (&str, &str) = ("template_category", "panos_full");

/// Deployment types stored in cloud buckets rather than local media.
pub const CLOUD_DEPLOYMENTS: [&str; 3] = ["s3", "azure", "gcp"];

/// AWS default region; the generation service expects it left blank.
const AWS_DEFAULT_REGION: &str = "us-east-1";

/// Fields already answered elsewhere and hidden on template configuration.
const HIDDEN_TEMPLATE_VARIABLES: [&str; 2] = ["hostname", "FW_NAME"];

/// Every step of the wizard.
pub fn bootstrap_steps() -> Vec<WorkflowStep> {
    vec![
        WorkflowStep::new(START, "Deployment Information")
            .with_fields(vec![
                FieldSpec::text("hostname", "Hostname")
                    .with_help("Hostname of the VM-Series firewall to bootstrap"),
                FieldSpec::choice(
                    "include_panorama",
                    "Include Panorama",
                    yes_no("Include Panorama", "Do not include Panorama"),
                )
                .with_default("no"),
                FieldSpec::choice(
                    "deployment_type",
                    "Deployment Type",
                    vec![
                        Choice::new("tgz", "Archive (tgz)"),
                        Choice::new("iso", "ISO image"),
                        Choice::new("s3", "AWS S3 bucket"),
                        Choice::new("azure", "Azure file share"),
                        Choice::new("gcp", "Google Cloud Storage bucket"),
                    ],
                )
                .with_default("tgz"),
            ])
            .then(after_start),
        WorkflowStep::new(CLOUD_AUTH, "Cloud Storage Credentials")
            .with_resolver(cloud_fields)
            .with_action(StepAction::NormalizeCloud)
            .then(after_cloud_auth),
        WorkflowStep::new(PANORAMA_CONFIG, "Configure Panorama Server")
            .with_fields(vec![
                FieldSpec::text("panorama_ip", "Panorama IP"),
                FieldSpec::text("panorama_user", "Panorama Username").with_default("admin"),
                FieldSpec::password("panorama_password", "Panorama Password"),
            ])
            .with_action(StepAction::EnrollPanorama)
            .then(|_| INCLUDE_CONTENT),
        WorkflowStep::new(CHOOSE_TEMPLATE, "Include Custom Bootstrap.xml?")
            .with_resolver(template_choices)
            .with_action(StepAction::SelectTemplate)
            .then(after_choose_template),
        WorkflowStep::new(CONFIGURE_TEMPLATE, "Configure Custom Bootstrap")
            .with_resolver(template_variables)
            .with_action(StepAction::RenderBootstrap)
            .then(|_| INCLUDE_CONTENT),
        WorkflowStep::new(UPLOAD_TEMPLATE, "Upload Custom Bootstrap.xml")
            .with_fields(vec![
                FieldSpec::text_area("bootstrap_upload", "Bootstrap XML Contents")
                    .optional()
                    .with_initial("<xml></xml>"),
            ])
            .with_action(StepAction::RenderBootstrap)
            .then(|_| INCLUDE_CONTENT),
        WorkflowStep::new(INCLUDE_CONTENT, "Include Dynamic Content?")
            .with_fields(vec![
                FieldSpec::choice(
                    "include_dynamic_content",
                    "Include Dynamic Content",
                    yes_no("Download latest content", "Do not include content"),
                )
                .with_default("no"),
            ])
            .then(after_include_content),
        WorkflowStep::new(DOWNLOAD_CONTENT, "Choose Package Type to Download")
            .with_fields(vec![
                FieldSpec::choice(
                    "package",
                    "Content Package",
                    vec![
                        Choice::new("appthreat", "Applications and Threats"),
                        Choice::new("app", "Applications only"),
                        Choice::new("antivirus", "Antivirus"),
                        Choice::new("wildfire", "WildFire"),
                    ],
                )
                .with_default("appthreat"),
            ])
            .with_action(StepAction::DownloadContent)
            .then(|_| CONFIGURE_MANAGEMENT),
        WorkflowStep::new(CONFIGURE_MANAGEMENT, "Management Interface")
            .with_fields(vec![
                FieldSpec::choice(
                    "network_type",
                    "Management Addressing",
                    vec![
                        Choice::new("dhcp-client", "DHCP client"),
                        Choice::new("static", "Static address"),
                    ],
                )
                .with_default("dhcp-client"),
            ])
            .then(after_configure_management),
        WorkflowStep::new(CONFIGURE_MANAGEMENT_STATIC, "Static Management Address")
            .with_fields(vec![
                FieldSpec::text("ip_address", "IP Address"),
                FieldSpec::text("netmask", "Netmask").with_default("255.255.255.0"),
                FieldSpec::text("default_gateway", "Default Gateway"),
                FieldSpec::text("dns_primary", "Primary DNS").with_default("8.8.8.8"),
                FieldSpec::text("dns_secondary", "Secondary DNS").optional(),
            ])
            .then(|_| COMPLETE),
        WorkflowStep::new(COMPLETE, "License Firewall with Auth Code")
            .with_fields(vec![
                FieldSpec::text("auth_key", "Auth Code")
                    .optional()
                    .with_help("Licensing auth code applied on first boot"),
            ])
            .with_action(StepAction::ShipPackage),
    ]
}

fn panorama_or_template(store: &WorkflowStore) -> &'static str {
    if store.get_or("include_panorama", "no") == "yes" {
        PANORAMA_CONFIG
    } else {
        CHOOSE_TEMPLATE
    }
}

pub fn after_start(store: &WorkflowStore) -> &'static str {
    if CLOUD_DEPLOYMENTS.contains(&store.get_or("deployment_type", "")) {
        CLOUD_AUTH
    } else {
        panorama_or_template(store)
    }
}

pub fn after_cloud_auth(store: &WorkflowStore) -> &'static str {
    panorama_or_template(store)
}

pub fn after_choose_template(store: &WorkflowStore) -> &'static str {
    match store.get_or("custom_bootstrap", CHOICE_NONE) {
        CHOICE_UPLOAD => UPLOAD_TEMPLATE,
        CHOICE_NONE => INCLUDE_CONTENT,
        _ => CONFIGURE_TEMPLATE,
    }
}

pub fn after_include_content(store: &WorkflowStore) -> &'static str {
    if store.get_or("include_dynamic_content", "no") == "yes" {
        DOWNLOAD_CONTENT
    } else {
        CONFIGURE_MANAGEMENT
    }
}

pub fn after_configure_management(store: &WorkflowStore) -> &'static str {
    if store.get_or("network_type", "dhcp-client") == "dhcp-client" {
        COMPLETE
    } else {
        CONFIGURE_MANAGEMENT_STATIC
    }
}

/// Blank out the AWS default region.
pub fn normalize_cloud(store: &mut WorkflowStore) {
    if store.get("aws_location") == Some(AWS_DEFAULT_REGION) {
        store.set("aws_location", "");
    }
}

/// Credential fields for the chosen cloud deployment.
pub fn cloud_fields(store: &WorkflowStore, _index: &CatalogIndex) -> Vec<FieldSpec> {
    match store.get_or("deployment_type", "") {
        "s3" => vec![
            FieldSpec::text("aws_location", "AWS Region").with_default(AWS_DEFAULT_REGION),
            FieldSpec::text("aws_key", "AWS Access Key ID"),
            FieldSpec::password("aws_secret", "AWS Secret Access Key"),
        ],
        "azure" => vec![
            FieldSpec::text("azure_storage_account", "Storage Account Name"),
            FieldSpec::password("azure_access_key", "Storage Access Key"),
        ],
        "gcp" => vec![
            FieldSpec::text("gcp_project_id", "Project ID"),
            FieldSpec::text_area("gcp_auth_json", "Service Account JSON"),
        ],
        _ => Vec::new(),
    }
}

/// The `custom_bootstrap` chooser.
///
/// Fixed entries come first; catalog templates follow sorted by label.
pub fn template_choices(_store: &WorkflowStore, index: &CatalogIndex) -> Vec<FieldSpec> {
    let (key, value) = TEMPLATE_CATEGORY;
    let mut eligible: Vec<Choice> = index
        .with_label(key, value)
        .filter(|t| {
            !RESERVED_TEMPLATE_NAMES.contains(&t.name.as_str())
                && t.name != DEFAULT_BOOTSTRAP_TEMPLATE
        })
        .map(|t| Choice::new(t.name.clone(), t.label.clone()))
        .collect();
    eligible.sort_by(|a, b| a.label.cmp(&b.label));

    let mut choices = vec![
        Choice::new(CHOICE_NONE, "Do not include a bootstrap.xml"),
        Choice::new(DEFAULT_BOOTSTRAP_TEMPLATE, "Use Default Bootstrap"),
        Choice::new(CHOICE_UPLOAD, "Upload Custom Bootstrap"),
    ];
    choices.extend(eligible);

    vec![FieldSpec::choice("custom_bootstrap", "Custom Bootstrap", choices).with_default(CHOICE_NONE)]
}

/// The selected template's declared variables, minus the ones already known.
pub fn template_variables(store: &WorkflowStore, index: &CatalogIndex) -> Vec<FieldSpec> {
    let Some(template) = index.get(store.get_or("custom_bootstrap", "")) else {
        return Vec::new();
    };

    template
        .variables
        .iter()
        .filter(|v| !HIDDEN_TEMPLATE_VARIABLES.contains(&v.name.as_str()))
        .map(|v| {
            let label = if v.description.is_empty() {
                v.name.clone()
            } else {
                v.description.clone()
            };
            let mut field = match v.type_hint.as_str() {
                "password" => FieldSpec::password(&v.name, label),
                "text_area" | "textarea" => FieldSpec::text_area(&v.name, label),
                _ => FieldSpec::text(&v.name, label),
            };
            if !v.default.is_empty() {
                field = field.with_default(&v.default);
            }
            field
        })
        .collect()
}

/// Whether `field` offers `value`.
pub fn offers_choice(field: &FieldSpec, value: &str) -> bool {
    matches!(&field.kind, FieldKind::Choice(choices) if choices.iter().any(|c| c.value == value))
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
