//! Pure domain builders for the filters skills need most.
//!
//! Every builder returns a [`Domain`]; "no filter" is the empty domain, never an
//! error, so callers stay resilient to schema drift on the remote side.

use chrono::NaiveDate;

use crate::domain::{Domain, FilterValue, Operator, Term};

/// Records whose `field` (a date column) falls in `[start, end]`, inclusive.
pub fn date_range(field: &str, start: NaiveDate, end: NaiveDate) -> Domain {
    Domain::leaf(field, Operator::Ge, start).with(field, Operator::Le, end)
}

/// Like [`date_range`] for datetime columns: covers the whole of both boundary days.
pub fn datetime_range(field: &str, start: NaiveDate, end: NaiveDate) -> Domain {
    Domain::leaf(field, Operator::Ge, format!("{} 00:00:00", start.format("%Y-%m-%d")))
        .with(field, Operator::Le, format!("{} 23:59:59", end.format("%Y-%m-%d")))
}

/// Families of remote models that share a `state` vocabulary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ModelKind {
    SaleOrder,
    Invoice,
    PurchaseOrder,
    Picking,
}

/// Map a semantic state name to the model's literal `state` value(s).
///
/// `"all"` and unknown `(state, kind)` pairs both map to no filter.
pub fn state_filter(state: &str, kind: ModelKind) -> Domain {
    let state = state.trim().to_ascii_lowercase();
    let values: &[&str] = match (kind, state.as_str()) {
        (_, "all" | "any" | "") => &[],

        (ModelKind::SaleOrder, "draft" | "quotation") => &["draft", "sent"],
        (ModelKind::SaleOrder, "sent") => &["sent"],
        (ModelKind::SaleOrder, "confirmed" | "sale") => &["sale", "done"],
        (ModelKind::SaleOrder, "done" | "locked") => &["done"],
        (ModelKind::SaleOrder, "cancelled" | "canceled" | "cancel") => &["cancel"],

        (ModelKind::Invoice, "draft") => &["draft"],
        (ModelKind::Invoice, "posted" | "confirmed") => &["posted"],
        (ModelKind::Invoice, "cancelled" | "canceled" | "cancel") => &["cancel"],

        (ModelKind::PurchaseOrder, "draft" | "rfq") => &["draft", "sent", "to approve"],
        (ModelKind::PurchaseOrder, "sent") => &["sent"],
        (ModelKind::PurchaseOrder, "confirmed" | "purchase") => &["purchase", "done"],
        (ModelKind::PurchaseOrder, "done" | "locked") => &["done"],
        (ModelKind::PurchaseOrder, "cancelled" | "canceled" | "cancel") => &["cancel"],

        (ModelKind::Picking, "draft") => &["draft"],
        (ModelKind::Picking, "waiting") => &["waiting", "confirmed"],
        (ModelKind::Picking, "ready" | "assigned") => &["assigned"],
        (ModelKind::Picking, "done") => &["done"],
        (ModelKind::Picking, "cancelled" | "canceled" | "cancel") => &["cancel"],

        _ => &[],
    };

    match values {
        [] => Domain::new(),
        [single] => Domain::leaf("state", Operator::Eq, *single),
        many => Domain::leaf("state", Operator::In, many.to_vec()),
    }
}

/// Filter on the accounting document type (`move_type`).
pub fn invoice_type_filter(kind: &str) -> Domain {
    let move_type = match kind.trim().to_ascii_lowercase().as_str() {
        "customer_invoice" | "out_invoice" | "invoice" => "out_invoice",
        "vendor_bill" | "in_invoice" | "bill" => "in_invoice",
        "customer_refund" | "out_refund" | "credit_note" => "out_refund",
        "vendor_refund" | "in_refund" => "in_refund",
        _ => return Domain::new(),
    };
    Domain::leaf("move_type", Operator::Eq, move_type)
}

/// Filter on invoice settlement (`payment_state`).
pub fn payment_state_filter(kind: &str) -> Domain {
    let values: &[&str] = match kind.trim().to_ascii_lowercase().as_str() {
        "open" | "outstanding" => &["not_paid", "partial"],
        "unpaid" | "not_paid" => &["not_paid"],
        "partial" => &["partial"],
        "paid" => &["paid", "in_payment"],
        _ => &[],
    };
    match values {
        [] => Domain::new(),
        [single] => Domain::leaf("payment_state", Operator::Eq, *single),
        many => Domain::leaf("payment_state", Operator::In, many.to_vec()),
    }
}

/// Flatten sub-domains into one implicitly AND-ed domain, preserving order.
///
/// `None` and empty inputs are dropped. A top-level expression identical to one
/// already kept is dropped. An `=`/`in` triple on a field an earlier `=`/`in`
/// triple already pins is dropped too: the first assertion wins. Every other
/// triple narrows the result and is kept, so `a != 3` and `a != 5` both
/// survive. Malformed sub-domains are appended verbatim.
pub fn combine_domains<I>(parts: I) -> Domain
where
    I: IntoIterator<Item = Option<Domain>>,
{
    let mut kept: Vec<Vec<Term>> = Vec::new();

    for part in parts.into_iter().flatten() {
        if part.is_empty() {
            continue;
        }
        let exprs: Vec<Vec<Term>> = match part.expressions() {
            Ok(exprs) => exprs.into_iter().map(<[Term]>::to_vec).collect(),
            Err(_) => vec![part.into_terms()],
        };
        for expr in exprs {
            if is_redundant(&kept, &expr) {
                continue;
            }
            kept.push(expr);
        }
    }

    Domain::from(kept.into_iter().flatten().collect::<Vec<_>>())
}

fn is_redundant(kept: &[Vec<Term>], expr: &[Term]) -> bool {
    if kept.iter().any(|k| k.as_slice() == expr) {
        return true;
    }
    let [Term::Condition(cond)] = expr else {
        return false;
    };
    if !cond.operator.pins_value() {
        return false;
    }
    kept.iter().any(|k| match k.as_slice() {
        [Term::Condition(other)] => other.operator.pins_value() && other.field == cond.field,
        _ => false,
    })
}

/// Convenience for `(field, "in", ids)` on relation ids.
pub fn ids_filter(field: &str, ids: &[i64]) -> Domain {
    if ids.is_empty() {
        return Domain::new();
    }
    Domain::leaf(field, Operator::In, FilterValue::List(ids.iter().map(|i| FilterValue::Int(*i)).collect()))
}
