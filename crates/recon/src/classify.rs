//! Column classifier: guesses which header carries the invoice number, the
//! order number and the customer name.
//!
//! Headers are reduced to lowercase ASCII-ish tokens and tested against a
//! fixed, ordered rule table in two passes: exact words (`nf`, `nfe`,
//! `pedido`) over every header, then synonyms over the columns still
//! unclaimed. Within a pass columns are visited in header order and the first
//! rule whose role is still free and whose predicate matches claims the
//! column. A column carries at most one role and a role is never reassigned.
//!
//! `numero` and `num` are synonyms for both invoice and order numbers, so when
//! neither header says `nf`/`nfe`/`pedido` outright, whichever ambiguous column
//! comes first becomes the invoice column. That is a known limitation of the
//! heuristic; the caller is expected to show the guess and accept overrides.

use unicode_normalization::UnicodeNormalization;

use crate::model::{Role, RoleMap};

const INVOICE_EXACT: &[&str] = &["nfe", "nf"];
const INVOICE_SYNONYMS: &[&str] = &[
    "nfe", "nf", "notafiscal", "numero", "numeronf", "num", "nota", "nnf", "nfiscal",
];

const ORDER_EXACT: &[&str] = &["pedido"];
const ORDER_SYNONYMS: &[&str] = &["pedido", "numped", "num_ped", "numero", "num", "ped"];

const CUSTOMER_SYNONYMS: &[&str] = &["cliente", "nome", "razaosocial", "destinatario", "emitente"];

/// Ordinal indicators and degree signs, as in "N°" / "Nº".
const ORDINAL_SYMBOLS: &[char] = &['\u{00B0}', '\u{00BA}', '\u{00AA}', '\u{02DA}'];

#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// One of the header's own tokens equals a listed word.
    Exact(&'static [&'static str]),
    /// A token or the compact (concatenated) header equals a listed word.
    Synonym(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    role: Role,
    matcher: Matcher,
}

const EXACT_RULES: &[Rule] = &[
    Rule { role: Role::InvoiceId, matcher: Matcher::Exact(INVOICE_EXACT) },
    Rule { role: Role::OrderId, matcher: Matcher::Exact(ORDER_EXACT) },
];

const SYNONYM_RULES: &[Rule] = &[
    Rule { role: Role::InvoiceId, matcher: Matcher::Synonym(INVOICE_SYNONYMS) },
    Rule { role: Role::OrderId, matcher: Matcher::Synonym(ORDER_SYNONYMS) },
    Rule { role: Role::CustomerName, matcher: Matcher::Synonym(CUSTOMER_SYNONYMS) },
];

/// Exact tier over every header first, then synonyms over what is left.
const PASSES: &[&[Rule]] = &[EXACT_RULES, SYNONYM_RULES];

/// Normalized view of one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTokens {
    pub tokens: Vec<String>,
    /// All tokens joined without spaces ("Razão Social" -> "razaosocial").
    pub compact: String,
}

impl HeaderTokens {
    pub fn parse(header: &str) -> Self {
        let spaced: String = header
            .chars()
            .map(|c| if ORDINAL_SYMBOLS.contains(&c) { ' ' } else { c })
            .collect();

        let cleaned: String = spaced
            .nfd()
            .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let tokens: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
        let compact = tokens.concat();
        Self { tokens, compact }
    }

    fn has_token(&self, words: &[&str]) -> bool {
        self.tokens.iter().any(|t| words.contains(&t.as_str()))
    }

    fn matches(&self, matcher: Matcher) -> bool {
        match matcher {
            Matcher::Exact(words) => self.has_token(words),
            Matcher::Synonym(words) => {
                self.has_token(words) || (!self.compact.is_empty() && words.contains(&self.compact.as_str()))
            }
        }
    }
}

/// Guess a role map for the given headers. Never fails; roles with no
/// plausible column stay `None`.
pub fn classify_columns<S: AsRef<str>>(columns: &[S]) -> RoleMap {
    let headers: Vec<HeaderTokens> = columns.iter().map(|c| HeaderTokens::parse(c.as_ref())).collect();
    let mut claimed = vec![false; columns.len()];
    let mut map = RoleMap::default();

    for rules in PASSES {
        for (i, header) in headers.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            let rule = rules
                .iter()
                .find(|rule| !map.is_assigned(rule.role) && header.matches(rule.matcher));

            if let Some(rule) = rule {
                let column = columns[i].as_ref();
                log::debug!("column '{column}' -> {} ({:?})", rule.role, rule.matcher);
                map.set(rule.role, column);
                claimed[i] = true;
            }
        }
        if Role::ALL.iter().all(|r| map.is_assigned(*r)) {
            break;
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_tokens_strip_symbols_and_accents() {
        let h = HeaderTokens::parse("  Nº da Nota-Fiscal ");
        assert_eq!(h.tokens, vec!["n", "da", "notafiscal"]);

        let h = HeaderTokens::parse("Razão Social");
        assert_eq!(h.tokens, vec!["razao", "social"]);
        assert_eq!(h.compact, "razaosocial");

        let h = HeaderTokens::parse("Num_Ped.");
        assert_eq!(h.tokens, vec!["numped"]);
    }

    #[test]
    fn invoice_headers_are_recognized() {
        for header in ["NFe", "N° NF", "Nota Fiscal", "nº nf-e", "Número NF"] {
            let map = classify_columns(&[header]);
            assert_eq!(map.invoice.as_deref(), Some(header), "header {header:?}");
        }
    }

    #[test]
    fn exact_tier_beats_synonym_within_a_column() {
        // "pedido" is an exact order hit even though "numero" is an invoice synonym.
        let map = classify_columns(&["Numero Pedido", "NF"]);
        assert_eq!(map.order.as_deref(), Some("Numero Pedido"));
        assert_eq!(map.invoice.as_deref(), Some("NF"));
    }

    #[test]
    fn ambiguous_numero_resolved_by_column_order() {
        let map = classify_columns(&["Numero", "Num Pedido", "Cliente"]);
        assert_eq!(map.invoice.as_deref(), Some("Numero"));
        assert_eq!(map.order.as_deref(), Some("Num Pedido"));
        assert_eq!(map.customer.as_deref(), Some("Cliente"));
    }

    #[test]
    fn later_exact_header_beats_earlier_synonym() {
        // A leading "Numero" index column must not steal the invoice role from "NFe".
        let map = classify_columns(&["Numero", "NFe", "Pedido", "Cliente"]);
        assert_eq!(map.invoice.as_deref(), Some("NFe"));
        assert_eq!(map.order.as_deref(), Some("Pedido"));
        assert_eq!(map.customer.as_deref(), Some("Cliente"));

        let map = classify_columns(&["Num", "Cliente", "Pedido"]);
        assert_eq!(map.invoice.as_deref(), Some("Num"));
        assert_eq!(map.order.as_deref(), Some("Pedido"));
    }

    #[test]
    fn ambiguous_columns_split_between_roles() {
        // Neither header is decisive: the first becomes the invoice, the second the order.
        let map = classify_columns(&["Num", "Numero"]);
        assert_eq!(map.invoice.as_deref(), Some("Num"));
        assert_eq!(map.order.as_deref(), Some("Numero"));
    }

    #[test]
    fn first_match_wins_and_is_never_reassigned() {
        let map = classify_columns(&["NFe", "NF", "Pedido", "Pedido Cliente", "Nome", "Cliente"]);
        assert_eq!(map.invoice.as_deref(), Some("NFe"));
        assert_eq!(map.order.as_deref(), Some("Pedido"));
        // "Pedido Cliente" cannot take the order role again; it falls through to customer.
        assert_eq!(map.customer.as_deref(), Some("Pedido Cliente"));
    }

    #[test]
    fn customer_synonyms() {
        for header in ["Razão Social", "Nome do Cliente", "Destinatário", "EMITENTE"] {
            let map = classify_columns(&[header]);
            assert_eq!(map.customer.as_deref(), Some(header), "header {header:?}");
        }
    }

    #[test]
    fn unknown_headers_leave_roles_unassigned() {
        let map = classify_columns(&["Data", "Valor", "Status"]);
        assert_eq!(map, RoleMap::default());
    }

    #[test]
    fn underscore_and_dot_forms_of_order_abbreviation() {
        let map = classify_columns(&["NF", "num_ped"]);
        assert_eq!(map.order.as_deref(), Some("num_ped"));
        let map = classify_columns(&["NF", "Num.Ped"]);
        assert_eq!(map.order.as_deref(), Some("Num.Ped"));
    }
}
