//! Record Emitter
//!
//! Drives the generation protocol for a single record:
//!
//! ```text
//! begin -> declare_identifier_field? -> declare_field* -> end
//! ```
//!
//! The identifier must come first because every later field saves relative
//! to it. Abstract records accept the calls but produce header-only plans.

use crate::error::{CodegenError, Result};

use super::catalog::LoaderDescriptor;
use super::plan::{
    ConstructorParam, FieldPlan, IdentifierPlan, RecordPlan, SaveBase, SavePlan, SaveStrategy,
    CLASS_KEY,
};
use super::names::safe_name;

/// Header-level description of a record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSpec {
    pub class_name: String,
    pub schema_name: String,
    pub parents: Vec<String>,
    pub doc: Option<String>,
    pub is_abstract: bool,
}

/// One field, already resolved to its final loader
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Field name as declared
    pub name: String,
    /// Document key
    pub key: String,
    pub loader: LoaderDescriptor,
    pub optional: bool,
    pub doc: Option<String>,
    pub subscope: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitterState {
    HeaderEmitted,
    IdentifierDeclared,
    FieldsDeclared,
}

#[derive(Debug)]
pub struct RecordEmitter {
    spec: RecordSpec,
    state: EmitterState,
    identifier: Option<IdentifierPlan>,
    has_class_field: bool,
    fields: Vec<FieldPlan>,
    /// Declared optionality, which may differ from the load-time flag
    declared_optional: Vec<bool>,
    attrs: Vec<String>,
}

impl RecordEmitter {
    pub fn begin(spec: RecordSpec) -> Self {
        tracing::debug!(record = %spec.class_name, parents = ?spec.parents, "begin record");
        Self {
            spec,
            state: EmitterState::HeaderEmitted,
            identifier: None,
            has_class_field: false,
            fields: Vec::new(),
            declared_optional: Vec::new(),
            attrs: Vec::new(),
        }
    }

    fn protocol_error(&self, reason: &str) -> CodegenError {
        CodegenError::EmitOrder {
            class_name: self.spec.class_name.clone(),
            reason: reason.to_string(),
        }
    }

    fn claim_key(&mut self, key: &str) -> Result<()> {
        if self.attrs.iter().any(|a| a == key) {
            return Err(CodegenError::InvalidSchema(format!(
                "record {} declares the document key '{}' twice",
                self.spec.schema_name, key
            )));
        }
        self.attrs.push(key.to_string());
        Ok(())
    }

    /// Declare the identifier field. Allowed once, before any other field.
    pub fn declare_identifier_field(&mut self, field: RecordField) -> Result<()> {
        match self.state {
            EmitterState::HeaderEmitted => {}
            EmitterState::IdentifierDeclared => {
                return Err(self.protocol_error("identifier field declared twice"))
            }
            EmitterState::FieldsDeclared => {
                return Err(self.protocol_error("identifier field declared after other fields"))
            }
        }
        self.state = EmitterState::IdentifierDeclared;
        if self.spec.is_abstract {
            return Ok(());
        }

        self.claim_key(&field.key)?;
        let member = safe_name(&field.name);
        self.identifier = Some(IdentifierPlan {
            field: member.clone(),
            key: field.key.clone(),
            optional: field.optional,
            subscope: field.subscope.clone(),
        });

        // The identifier is read whenever present; defaulting covers absence
        self.fields.push(FieldPlan {
            safe_name: member,
            key: field.key,
            loader: field.loader.name.clone(),
            optional: true,
            doc: field.doc,
            save: SavePlan {
                strategy: save_strategy(&field.loader),
                base: SaveBase::Ambient,
            },
        });
        self.declared_optional.push(field.optional);
        Ok(())
    }

    pub fn declare_field(&mut self, field: RecordField) -> Result<()> {
        self.state = EmitterState::FieldsDeclared;
        if self.spec.is_abstract {
            return Ok(());
        }

        self.claim_key(&field.key)?;
        if field.key == CLASS_KEY {
            self.has_class_field = true;
            return Ok(());
        }

        let base = match &self.identifier {
            Some(id) => SaveBase::Identifier {
                field: id.field.clone(),
                subscope: id.subscope.clone(),
            },
            None => SaveBase::Ambient,
        };
        self.fields.push(FieldPlan {
            safe_name: safe_name(&field.name),
            key: field.key,
            loader: field.loader.name.clone(),
            optional: field.optional,
            doc: field.doc,
            save: SavePlan {
                strategy: save_strategy(&field.loader),
                base,
            },
        });
        self.declared_optional.push(field.optional);
        Ok(())
    }

    pub fn end(self) -> RecordPlan {
        let constructor = if self.spec.is_abstract {
            Vec::new()
        } else {
            let params = self.fields.iter().zip(&self.declared_optional).map(|(f, optional)| {
                ConstructorParam {
                    name: f.safe_name.clone(),
                    loader: f.loader.clone(),
                    optional: *optional,
                }
            });
            let (mut required, optional): (Vec<_>, Vec<_>) = params.partition(|p| !p.optional);
            required.extend(optional);
            required
        };

        tracing::debug!(
            record = %self.spec.class_name,
            fields = self.fields.len(),
            "end record"
        );

        RecordPlan {
            class_name: self.spec.class_name,
            schema_name: self.spec.schema_name,
            parents: self.spec.parents,
            doc: self.spec.doc,
            is_abstract: self.spec.is_abstract,
            has_class_field: self.has_class_field,
            identifier: self.identifier,
            fields: self.fields,
            constructor,
            attrs: self.attrs,
        }
    }
}

fn save_strategy(loader: &LoaderDescriptor) -> SaveStrategy {
    if loader.is_uri {
        SaveStrategy::RelativeUri {
            scoped_id: loader.scoped_id,
            ref_scope: loader.ref_scope,
        }
    } else {
        SaveStrategy::Recursive
    }
}
