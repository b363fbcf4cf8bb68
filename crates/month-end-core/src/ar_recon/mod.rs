//! AR aging vs trial-balance detail reconciliation.
//!
//! Both exports list open invoice balances per customer. Reconciliation runs
//! at the invoice level (outer join on customer + invoice number) and again
//! at the customer level, flagging any variance that survives rounding to
//! cents.

pub mod reconcile;

pub use reconcile::{
    reconcile_invoices, ArRecon, ArReconSummary, CustomerVariance, InvoiceVariance, OpenInvoice,
};
