//! Entity schemas - one configuration table per back-office entity
//!
//! Every list screen, form and projection is driven by an `EntitySchema`
//! instead of hand-written per-entity code. Built-in schemas cover the core
//! master data; the config file can add or override them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A table column projected from the DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Key of the projected cell (also the search field name)
    pub key: String,
    /// Dot path into the DTO, e.g. `primaryParty.partyFullName`
    pub path: String,
    /// Label configuration id resolved through the label catalog
    pub label_id: String,
    /// Shown until (or unless) the label catalog resolves `label_id`
    pub fallback_label: String,
    /// Preferred column width in cells
    #[serde(default)]
    pub width: Option<u16>,
}

/// Input kind for a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Flag,
    Date,
}

/// A field in the create/edit panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    /// Dot path written into the payload
    pub path: String,
    pub label_id: String,
    pub fallback_label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Regex the trimmed value must match when non-empty
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub max_len: Option<usize>,
}

/// Configuration for one REST resource and its screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Short name used on the command line and in the resource picker
    pub name: String,
    pub title: String,
    /// Collection path relative to the base URL, e.g. `/api/currencies`
    pub resource: String,
    /// Module name for label lookup, workflow actions and documents
    pub module: String,
    /// Dot path of the human-readable record label
    pub label_path: String,
    /// Dot path of the status string inside the nested status DTO
    pub status_path: String,
    pub default_status: String,
    pub columns: Vec<ColumnSpec>,
    /// Column keys that take part in search
    #[serde(default)]
    pub searchable: Vec<String>,
    #[serde(default)]
    pub form: Vec<FieldSpec>,
    /// Merged under every DTO before projection
    #[serde(default)]
    pub defaults: Value,
    #[serde(default)]
    pub approvable: bool,
    #[serde(default)]
    pub documents: bool,
}

impl EntitySchema {
    /// Start building a schema
    pub fn builder(name: &str, title: &str, resource: &str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            schema: EntitySchema {
                name: name.to_string(),
                title: title.to_string(),
                resource: resource.to_string(),
                module: name.to_uppercase().replace('-', "_"),
                label_path: "name".to_string(),
                status_path: "status.name".to_string(),
                default_status: "ACTIVE".to_string(),
                columns: Vec::new(),
                searchable: Vec::new(),
                form: Vec::new(),
                defaults: Value::Null,
                approvable: false,
                documents: false,
            },
        }
    }

    /// Look up a column by key
    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Whether a column key participates in search
    pub fn is_searchable(&self, key: &str) -> bool {
        self.searchable.iter().any(|k| k == key)
    }

    /// Searchable columns in display order
    pub fn search_columns(&self) -> Vec<&ColumnSpec> {
        self.columns
            .iter()
            .filter(|c| self.is_searchable(&c.key))
            .collect()
    }
}

/// Fluent builder for [`EntitySchema`]
pub struct EntitySchemaBuilder {
    schema: EntitySchema,
}

impl EntitySchemaBuilder {
    pub fn module(mut self, module: &str) -> Self {
        self.schema.module = module.to_string();
        self
    }

    pub fn label_path(mut self, path: &str) -> Self {
        self.schema.label_path = path.to_string();
        self
    }

    pub fn status(mut self, path: &str, default_status: &str) -> Self {
        self.schema.status_path = path.to_string();
        self.schema.default_status = default_status.to_string();
        self
    }

    /// Add a column; `searchable` also registers it as a search field
    pub fn column(mut self, key: &str, path: &str, label_id: &str, fallback: &str, searchable: bool) -> Self {
        self.schema.columns.push(ColumnSpec {
            key: key.to_string(),
            path: path.to_string(),
            label_id: label_id.to_string(),
            fallback_label: fallback.to_string(),
            width: None,
        });
        if searchable {
            self.schema.searchable.push(key.to_string());
        }
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.schema.form.push(field);
        self
    }

    pub fn defaults(mut self, defaults: Value) -> Self {
        self.schema.defaults = defaults;
        self
    }

    pub fn approvable(mut self) -> Self {
        self.schema.approvable = true;
        self
    }

    pub fn documents(mut self) -> Self {
        self.schema.documents = true;
        self
    }

    pub fn build(self) -> EntitySchema {
        self.schema
    }
}

impl FieldSpec {
    /// A plain text field
    pub fn text(key: &str, path: &str, label_id: &str, fallback: &str) -> Self {
        Self {
            key: key.to_string(),
            path: path.to_string(),
            label_id: label_id.to_string(),
            fallback_label: fallback.to_string(),
            kind: FieldKind::Text,
            required: false,
            pattern: None,
            max_len: None,
        }
    }

    pub fn number(key: &str, path: &str, label_id: &str, fallback: &str) -> Self {
        Self {
            kind: FieldKind::Number,
            ..Self::text(key, path, label_id, fallback)
        }
    }

    pub fn flag(key: &str, path: &str, label_id: &str, fallback: &str) -> Self {
        Self {
            kind: FieldKind::Flag,
            ..Self::text(key, path, label_id, fallback)
        }
    }

    pub fn date(key: &str, path: &str, label_id: &str, fallback: &str) -> Self {
        Self {
            kind: FieldKind::Date,
            pattern: Some(r"^\d{4}-\d{2}-\d{2}$".to_string()),
            ..Self::text(key, path, label_id, fallback)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }
}

/// Ordered set of schemas known to the console
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<EntitySchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    /// Registry holding the built-in back-office entities
    pub fn builtin() -> Self {
        Self {
            schemas: builtin_schemas(),
        }
    }

    /// Add schemas, replacing built-ins that share a name
    pub fn merge(&mut self, extra: Vec<EntitySchema>) {
        for schema in extra {
            match self.schemas.iter_mut().find(|s| s.name == schema.name) {
                Some(existing) => *existing = schema,
                None => self.schemas.push(schema),
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn all(&self) -> &[EntitySchema] {
        &self.schemas
    }

    pub fn names(&self) -> Vec<String> {
        self.schemas.iter().map(|s| s.name.clone()).collect()
    }
}

fn builtin_schemas() -> Vec<EntitySchema> {
    vec![
        EntitySchema::builder("agreements", "Escrow Agreements", "/api/escrow-agreements")
            .module("ESCROW_AGREEMENT")
            .label_path("agreementName")
            .status("taskStatus.name", "INITIATED")
            .column("agreementRefNo", "agreementRefNo", "CDL_EA_REF_NO", "Agreement Ref", true)
            .column("agreementName", "agreementName", "CDL_EA_NAME", "Agreement Name", true)
            .column("partyFullName", "primaryParty.partyFullName", "CDL_EA_PARTY", "Primary Party", true)
            .column("currencyCode", "currency.currencyCode", "CDL_EA_CCY", "Currency", false)
            .column("criticality", "criticality.name", "CDL_EA_CRITICALITY", "Criticality", false)
            .field(FieldSpec::text("agreementRefNo", "agreementRefNo", "CDL_EA_REF_NO", "Agreement Ref").required().max_len(35))
            .field(FieldSpec::text("agreementName", "agreementName", "CDL_EA_NAME", "Agreement Name").required())
            .field(FieldSpec::text("currencyCode", "currency.currencyCode", "CDL_EA_CCY", "Currency").pattern("^[A-Z]{3}$"))
            .field(FieldSpec::date("effectiveDate", "effectiveDate", "CDL_EA_EFFECTIVE", "Effective Date"))
            .defaults(json!({ "criticality": { "name": "N/A" } }))
            .approvable()
            .documents()
            .build(),
        EntitySchema::builder("parties", "Parties", "/api/parties")
            .module("PARTY")
            .label_path("partyFullName")
            .status("status.name", "INITIATED")
            .column("partyCifNumber", "partyCifNumber", "CDL_PTY_CIF", "CIF Number", true)
            .column("partyFullName", "partyFullName", "CDL_PTY_NAME", "Full Name", true)
            .column("emailAddress", "emailAddress", "CDL_PTY_EMAIL", "Email", true)
            .column("mobileNumber", "mobileNumber", "CDL_PTY_MOBILE", "Mobile", false)
            .column("partyRole", "partyRole.name", "CDL_PTY_ROLE", "Role", false)
            .field(FieldSpec::text("partyCifNumber", "partyCifNumber", "CDL_PTY_CIF", "CIF Number").required())
            .field(FieldSpec::text("partyFullName", "partyFullName", "CDL_PTY_NAME", "Full Name").required())
            .field(FieldSpec::text("emailAddress", "emailAddress", "CDL_PTY_EMAIL", "Email").pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))
            .field(FieldSpec::text("mobileNumber", "mobileNumber", "CDL_PTY_MOBILE", "Mobile").pattern(r"^\+?[0-9 ]{6,20}$"))
            .approvable()
            .documents()
            .build(),
        EntitySchema::builder("accounts", "Accounts", "/api/accounts")
            .module("ACCOUNT")
            .label_path("accountTitle")
            .column("accountNumber", "accountNumber", "CDL_ACC_NO", "Account No", true)
            .column("accountTitle", "accountTitle", "CDL_ACC_TITLE", "Title", true)
            .column("accountType", "accountType.name", "CDL_ACC_TYPE", "Type", false)
            .column("currencyCode", "currency.currencyCode", "CDL_ACC_CCY", "Currency", true)
            .field(FieldSpec::text("accountNumber", "accountNumber", "CDL_ACC_NO", "Account No").required().pattern("^[0-9A-Z-]{4,34}$"))
            .field(FieldSpec::text("accountTitle", "accountTitle", "CDL_ACC_TITLE", "Title").required())
            .field(FieldSpec::text("currencyCode", "currency.currencyCode", "CDL_ACC_CCY", "Currency").required().pattern("^[A-Z]{3}$"))
            .defaults(json!({ "accountType": { "name": "N/A" } }))
            .build(),
        EntitySchema::builder("beneficiaries", "Beneficiaries", "/api/beneficiaries")
            .module("BENEFICIARY")
            .label_path("beneficiaryName")
            .status("status.name", "INITIATED")
            .column("beneficiaryName", "beneficiaryName", "CDL_BEN_NAME", "Beneficiary", true)
            .column("beneficiaryAccountNumber", "beneficiaryAccountNumber", "CDL_BEN_ACC", "Account No", true)
            .column("bankName", "bank.bankName", "CDL_BEN_BANK", "Bank", true)
            .column("swiftCode", "swiftCode", "CDL_BEN_SWIFT", "SWIFT", false)
            .field(FieldSpec::text("beneficiaryName", "beneficiaryName", "CDL_BEN_NAME", "Beneficiary").required())
            .field(FieldSpec::text("beneficiaryAccountNumber", "beneficiaryAccountNumber", "CDL_BEN_ACC", "Account No").required())
            .field(FieldSpec::text("swiftCode", "swiftCode", "CDL_BEN_SWIFT", "SWIFT").pattern("^[A-Z0-9]{8}([A-Z0-9]{3})?$"))
            .approvable()
            .build(),
        EntitySchema::builder("currencies", "Currencies", "/api/currencies")
            .module("CURRENCY")
            .label_path("currencyCode")
            .column("currencyCode", "currencyCode", "CDL_CCY_CODE", "Code", true)
            .column("description", "description", "CDL_CCY_DESC", "Description", true)
            .column("decimalPlaces", "decimalPlaces", "CDL_CCY_DECIMALS", "Decimals", false)
            .column("enabled", "enabled", "CDL_CCY_ENABLED", "Enabled", false)
            .field(FieldSpec::text("currencyCode", "currencyCode", "CDL_CCY_CODE", "Code").required().pattern("^[A-Z]{3}$"))
            .field(FieldSpec::text("description", "description", "CDL_CCY_DESC", "Description").required().max_len(100))
            .field(FieldSpec::number("decimalPlaces", "decimalPlaces", "CDL_CCY_DECIMALS", "Decimals"))
            .field(FieldSpec::flag("enabled", "enabled", "CDL_CCY_ENABLED", "Enabled"))
            .build(),
        EntitySchema::builder("countries", "Countries", "/api/countries")
            .module("COUNTRY")
            .label_path("countryName")
            .column("countryCode", "countryCode", "CDL_CTRY_CODE", "Code", true)
            .column("countryName", "countryName", "CDL_CTRY_NAME", "Country", true)
            .column("dialCode", "dialCode", "CDL_CTRY_DIAL", "Dial Code", false)
            .field(FieldSpec::text("countryCode", "countryCode", "CDL_CTRY_CODE", "Code").required().pattern("^[A-Z]{2}$"))
            .field(FieldSpec::text("countryName", "countryName", "CDL_CTRY_NAME", "Country").required())
            .field(FieldSpec::text("dialCode", "dialCode", "CDL_CTRY_DIAL", "Dial Code"))
            .build(),
        EntitySchema::builder("ledger-accounts", "Ledger Accounts", "/api/ledger-accounts")
            .module("LEDGER_ACCOUNT")
            .label_path("ledgerAccountName")
            .column("ledgerAccountNumber", "ledgerAccountNumber", "CDL_GL_NO", "GL Number", true)
            .column("ledgerAccountName", "ledgerAccountName", "CDL_GL_NAME", "GL Name", true)
            .column("branchCode", "branchCode", "CDL_GL_BRANCH", "Branch", true)
            .column("currencyCode", "currency.currencyCode", "CDL_GL_CCY", "Currency", false)
            .field(FieldSpec::text("ledgerAccountNumber", "ledgerAccountNumber", "CDL_GL_NO", "GL Number").required())
            .field(FieldSpec::text("ledgerAccountName", "ledgerAccountName", "CDL_GL_NAME", "GL Name").required())
            .field(FieldSpec::text("branchCode", "branchCode", "CDL_GL_BRANCH", "Branch"))
            .field(FieldSpec::text("currencyCode", "currency.currencyCode", "CDL_GL_CCY", "Currency").pattern("^[A-Z]{3}$"))
            .build(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_core_entities() {
        let registry = SchemaRegistry::builtin();
        for name in ["agreements", "parties", "accounts", "beneficiaries", "currencies", "countries", "ledger-accounts"] {
            assert!(registry.get(name).is_some(), "missing schema {}", name);
        }
    }

    #[test]
    fn test_searchable_keys_refer_to_columns() {
        let registry = SchemaRegistry::builtin();
        for schema in registry.all() {
            for key in &schema.searchable {
                assert!(schema.column(key).is_some(), "{}: {} is not a column", schema.name, key);
            }
        }
    }

    #[test]
    fn test_merge_replaces_and_appends() {
        let mut registry = SchemaRegistry::builtin();
        let before = registry.all().len();

        let currencies = EntitySchema::builder("currencies", "FX Currencies", "/api/v2/currencies").build();
        let banks = EntitySchema::builder("banks", "Banks", "/api/banks")
            .column("bankName", "bankName", "CDL_BANK_NAME", "Bank", true)
            .build();
        registry.merge(vec![currencies, banks]);

        assert_eq!(registry.all().len(), before + 1);
        assert_eq!(registry.get("currencies").map(|s| s.title.as_str()), Some("FX Currencies"));
        assert_eq!(registry.get("banks").map(|s| s.module.as_str()), Some("BANKS"));
    }

    #[test]
    fn test_schema_deserializes_with_defaults() {
        let raw = r#"{
            "name": "branches",
            "title": "Branches",
            "resource": "/api/branches",
            "module": "BRANCH",
            "label_path": "branchName",
            "status_path": "status.name",
            "default_status": "ACTIVE",
            "columns": [
                { "key": "branchName", "path": "branchName", "label_id": "CDL_BR_NAME", "fallback_label": "Branch" }
            ]
        }"#;
        let schema: EntitySchema = serde_json::from_str(raw).unwrap();
        assert!(schema.searchable.is_empty());
        assert!(!schema.approvable);
        assert_eq!(schema.defaults, Value::Null);
        assert_eq!(schema.columns[0].width, None);
    }
}
