// src/schema/registry.rs

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::types::RecordSchema;

/// Layouts shipped with the crate.
///
/// `C100` has three: the 29-field layout of the EFD ICMS/IPI practical guide
/// (no `SUB`, PIS/COFINS tail included), plus the 26- and 30-field variants
/// with `SUB` found in simplified exports. `C170` has the 21-field base and the
/// 37-field guide layout.
pub static BUILTIN: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::builtin);

const L_0000: &[&str] = &[
    "REG", "COD_VER", "COD_FIN", "DT_INI", "DT_FIN", "NOME", "CNPJ", "CPF", "UF", "IE",
    "COD_MUN", "IM", "SUFRAMA", "IND_PERFIL", "IND_ATIV",
];

const L_C100: &[&str] = &[
    "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "SUB", "NUM_DOC",
    "CHV_NFE", "DT_DOC", "DT_E_S", "VL_DOC", "IND_PGTO", "VL_DESC", "VL_ABAT_NT", "VL_MERC",
    "IND_FRT", "VL_FRT", "VL_SEG", "VL_OUT_DA", "VL_BC_ICMS", "VL_ICMS", "VL_BC_ICMS_ST",
    "VL_ICMS_ST", "VL_IPI",
];

const C100_PIS_COFINS: &[&str] = &["VL_PIS", "VL_COFINS", "VL_PIS_ST", "VL_COFINS_ST"];

const L_C170: &[&str] = &[
    "REG", "NUM_ITEM", "COD_ITEM", "DESCR_COMPL", "QTD", "UNID", "VL_ITEM", "VL_DESC",
    "IND_MOV", "CST_ICMS", "CFOP", "COD_NAT", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS",
    "VL_BC_ICMS_ST", "ALIQ_ST", "VL_ICMS_ST", "IND_APUR", "CST_IPI", "COD_ENQ",
];

const C170_TAIL: &[&str] = &[
    "VL_BC_IPI", "ALIQ_IPI", "VL_IPI", "CST_PIS", "VL_BC_PIS", "ALIQ_PIS", "QUANT_BC_PIS",
    "ALIQ_PIS_QUANT", "VL_PIS", "CST_COFINS", "VL_BC_COFINS", "ALIQ_COFINS",
    "QUANT_BC_COFINS", "ALIQ_COFINS_QUANT", "VL_COFINS", "COD_CTA",
];

const L_D100: &[&str] = &[
    "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "SUB", "NUM_DOC",
    "CHV_CTE", "DT_DOC", "DT_A_P", "TP_CT-E", "CHV_CTE_REF", "VL_DOC", "VL_DESC", "IND_FRT",
    "VL_SERV", "VL_BC_ICMS", "VL_ICMS", "VL_NT",
];

const L_E110: &[&str] = &[
    "REG", "VL_TOT_DEBITOS", "VL_AJ_DEBITOS", "VL_TOT_AJ_DEBITOS", "VL_ESTORNOS_CRED",
    "VL_TOT_CREDITOS", "VL_AJ_CREDITOS", "VL_TOT_AJ_CREDITOS", "VL_ESTORNOS_DEB",
    "VL_SLD_CREDOR_ANT", "VL_SLD_APURADO", "VL_TOT_DED", "VL_ICMS_RECOLHER",
    "VL_SLD_CREDOR_TRANSPORTAR", "DEB_ESP",
];

const L_H005: &[&str] = &["REG", "DT_INV", "VL_INV", "MOT_INV"];

const L_H010: &[&str] = &[
    "REG", "COD_ITEM", "UNID", "QTD", "VL_UNIT", "VL_ITEM", "IND_PROP", "COD_PART",
    "TXT_COMPL", "COD_CTA",
];

/// Record-type code → every known layout for that code, keyed by arity.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    layouts: HashMap<String, BTreeMap<usize, RecordSchema>>,
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        let c100_full: Vec<&str> = L_C100.iter().chain(C100_PIS_COFINS).copied().collect();
        let c100_efd: Vec<&str> = c100_full.iter().copied().filter(|f| *f != "SUB").collect();
        let c170_full: Vec<&str> = L_C170.iter().chain(C170_TAIL).copied().collect();

        for schema in [
            RecordSchema::new("0000", L_0000),
            RecordSchema::new("C100", L_C100),
            RecordSchema::new("C100", &c100_full),
            RecordSchema::new("C100", &c100_efd),
            RecordSchema::new("C170", L_C170),
            RecordSchema::new("C170", &c170_full),
            RecordSchema::new("D100", L_D100),
            RecordSchema::new("E110", L_E110),
            RecordSchema::new("H005", L_H005),
            RecordSchema::new("H010", L_H010),
        ] {
            reg.insert(schema);
        }
        reg
    }

    /// Add a layout. A layout with the same code and arity as an existing one
    /// replaces it. Layouts with repeated field names are rejected.
    pub fn register(&mut self, schema: RecordSchema) -> Result<()> {
        if schema.fields.is_empty() {
            bail!("layout for `{}` has no fields", schema.code);
        }
        if let Some(dup) = schema.duplicate_field() {
            bail!("layout for `{}` repeats field `{}`", schema.code, dup);
        }
        self.insert(schema);
        Ok(())
    }

    /// Copy of `self` extended with `extra` (code → list of field-name lists).
    pub fn with_layouts(&self, extra: &BTreeMap<String, Vec<Vec<String>>>) -> Result<Self> {
        let mut reg = self.clone();
        for (code, layouts) in extra {
            for fields in layouts {
                reg.register(RecordSchema {
                    code: code.clone(),
                    fields: fields.clone(),
                })?;
            }
        }
        Ok(reg)
    }

    fn insert(&mut self, schema: RecordSchema) {
        let by_arity = self.layouts.entry(schema.code.clone()).or_default();
        if by_arity.contains_key(&schema.arity()) {
            debug!(code = %schema.code, arity = schema.arity(), "replacing layout");
        }
        by_arity.insert(schema.arity(), schema);
    }

    /// The layout for `code` whose arity is exactly `arity`, if one is known.
    /// Unknown codes and mismatched arities both yield `None`.
    pub fn resolve(&self, code: &str, arity: usize) -> Option<&RecordSchema> {
        self.layouts.get(code).and_then(|m| m.get(&arity))
    }

    /// Arities registered for `code`, ascending. Empty for unknown codes.
    pub fn known_arities(&self, code: &str) -> Vec<usize> {
        self.layouts
            .get(code)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.layouts.contains_key(code)
    }
}
