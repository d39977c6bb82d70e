//! Static catalog of the MXP read operations
//!
//! Each logical operation maps to one fixed upstream path and an ordered list of
//! parameters. Caller arguments are validated and coerced here, before any request
//! to the backend is built.

use axum::http::Method;
use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::utils::{normalize_date, normalize_integer, normalize_text};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Account,
    Crew,
    Folio,
    Document,
    ICafe,
    PersonImage,
    QuickCode,
    SailorManifest,
    ReceiptImage,
    PersonInvoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Date,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Name accepted from callers.
    pub name: &'static str,
    /// Query key sent to the backend.
    pub upstream_key: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Object,
    List,
    Image,
}

#[derive(Debug)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub name: &'static str,
    pub method: Method,
    /// Upstream path, appended to the configured base URL.
    pub path: &'static str,
    /// Route served by the REST facade.
    pub rest_path: &'static str,
    pub params: &'static [ParamSpec],
    /// Pair of date parameters that must be ordered when both are given.
    pub date_range: Option<(&'static str, &'static str)>,
    pub shape: ResponseShape,
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        upstream_key: name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        upstream_key: name,
        kind,
        required: false,
    }
}

// Indexed by `Operation as usize`.
static OPERATIONS: [OperationDescriptor; 10] = [
    OperationDescriptor {
        operation: Operation::Account,
        name: "account",
        method: Method::GET,
        path: "/account",
        rest_path: "/account/{charge_id}",
        params: &[required("charge_id", ParamKind::Integer)],
        date_range: None,
        shape: ResponseShape::Object,
    },
    OperationDescriptor {
        operation: Operation::Crew,
        name: "crew",
        method: Method::GET,
        path: "/crew",
        rest_path: "/crew",
        params: &[ParamSpec {
            name: "pin",
            upstream_key: "PIN",
            kind: ParamKind::Integer,
            required: false,
        }],
        date_range: None,
        shape: ResponseShape::List,
    },
    OperationDescriptor {
        operation: Operation::Folio,
        name: "folio",
        method: Method::GET,
        path: "/folio",
        rest_path: "/folio/{folio_id}",
        params: &[
            required("folio_id", ParamKind::Integer),
            optional("date_from", ParamKind::Date),
            optional("date_to", ParamKind::Date),
        ],
        date_range: Some(("date_from", "date_to")),
        shape: ResponseShape::Object,
    },
    OperationDescriptor {
        operation: Operation::Document,
        name: "document",
        method: Method::GET,
        path: "/document",
        rest_path: "/document/{document_id}",
        params: &[required("document_id", ParamKind::Integer)],
        date_range: None,
        shape: ResponseShape::Object,
    },
    OperationDescriptor {
        operation: Operation::ICafe,
        name: "icafe",
        method: Method::GET,
        path: "/iCafe",
        rest_path: "/icafe",
        params: &[
            optional("icafe_id", ParamKind::Integer),
            optional("room_nr", ParamKind::Text),
            optional("date_of_birth", ParamKind::Date),
            optional("last_name", ParamKind::Text),
            optional("pin", ParamKind::Integer),
        ],
        date_range: None,
        shape: ResponseShape::Object,
    },
    OperationDescriptor {
        operation: Operation::PersonImage,
        name: "person_image",
        method: Method::GET,
        path: "/personImageById",
        rest_path: "/person-image/{person_id}",
        params: &[required("person_id", ParamKind::Integer)],
        date_range: None,
        shape: ResponseShape::Image,
    },
    OperationDescriptor {
        operation: Operation::QuickCode,
        name: "quick_code",
        method: Method::GET,
        path: "/quickCode",
        rest_path: "/quick-code",
        params: &[],
        date_range: None,
        shape: ResponseShape::List,
    },
    OperationDescriptor {
        operation: Operation::SailorManifest,
        name: "sailor_manifest",
        method: Method::GET,
        path: "/sailorManifest",
        rest_path: "/sailor-manifest",
        params: &[
            optional("installation_code", ParamKind::Text),
            optional("voyage_embark_date", ParamKind::Date),
            optional("voyage_debark_date", ParamKind::Date),
        ],
        date_range: Some(("voyage_embark_date", "voyage_debark_date")),
        shape: ResponseShape::List,
    },
    OperationDescriptor {
        operation: Operation::ReceiptImage,
        name: "receipt_image",
        method: Method::GET,
        path: "/receiptImage",
        rest_path: "/receipt-image/{receipt_id}",
        params: &[required("receipt_id", ParamKind::Integer)],
        date_range: None,
        shape: ResponseShape::Image,
    },
    OperationDescriptor {
        operation: Operation::PersonInvoice,
        name: "person_invoice",
        method: Method::GET,
        path: "/personInvoice",
        rest_path: "/person-invoice/{person_id}",
        params: &[required("person_id", ParamKind::Integer)],
        date_range: None,
        shape: ResponseShape::Object,
    },
];

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Account,
        Operation::Crew,
        Operation::Folio,
        Operation::Document,
        Operation::ICafe,
        Operation::PersonImage,
        Operation::QuickCode,
        Operation::SailorManifest,
        Operation::ReceiptImage,
        Operation::PersonInvoice,
    ];

    pub fn descriptor(self) -> &'static OperationDescriptor {
        &OPERATIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

/// iCafe filters. Guests are found by `room_nr` and `date_of_birth`, crew by
/// `last_name` and `pin`. All empty lists every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IcafeLookup {
    pub icafe_id: Option<i64>,
    pub room_nr: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub last_name: Option<String>,
    pub pin: Option<i64>,
}

/// A validated call against one operation, with query pairs in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub operation: Operation,
    pub query: Vec<(&'static str, String)>,
}

impl OperationRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            query: Vec::new(),
        }
    }

    /// Validates loosely-typed caller arguments against the operation's parameters.
    ///
    /// Missing required parameters and malformed values are rejected. Unknown keys
    /// are ignored and JSON `null` counts as absent.
    pub fn from_arguments(
        operation: Operation,
        arguments: &Map<String, Value>,
    ) -> Result<Self, AppError> {
        let descriptor = operation.descriptor();
        let mut request = Self::new(operation);
        let mut dates: Vec<(&'static str, NaiveDate)> = Vec::new();

        for spec in descriptor.params {
            let Some(value) = arguments.get(spec.name).filter(|value| !value.is_null()) else {
                if spec.required {
                    return Err(AppError::bad_request(
                        "missing_parameter",
                        format!("{} is required", spec.name),
                    ));
                }
                continue;
            };

            let normalized = match spec.kind {
                ParamKind::Integer => normalize_integer(spec.name, value)?.to_string(),
                ParamKind::Date => {
                    let date = normalize_date(spec.name, value)?;
                    dates.push((spec.name, date));
                    date.to_string()
                }
                ParamKind::Text => normalize_text(spec.name, value)?,
            };
            request.query.push((spec.upstream_key, normalized));
        }

        if let Some((start_name, end_name)) = descriptor.date_range {
            let lookup = |name: &str| {
                dates
                    .iter()
                    .find(|(candidate, _)| *candidate == name)
                    .map(|(_, date)| *date)
            };
            if let (Some(start), Some(end)) = (lookup(start_name), lookup(end_name)) {
                if start > end {
                    return Err(AppError::bad_request(
                        "invalid_date_range",
                        format!("{start_name} must not be after {end_name}"),
                    ));
                }
            }
        }

        Ok(request)
    }

    pub fn account(charge_id: i64) -> Self {
        Self::new(Operation::Account).with("charge_id", charge_id)
    }

    pub fn crew(pin: Option<i64>) -> Self {
        Self::new(Operation::Crew).with_optional("pin", pin)
    }

    pub fn folio(folio_id: i64, date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) -> Self {
        Self::new(Operation::Folio)
            .with("folio_id", folio_id)
            .with_optional("date_from", date_from)
            .with_optional("date_to", date_to)
    }

    pub fn document(document_id: i64) -> Self {
        Self::new(Operation::Document).with("document_id", document_id)
    }

    pub fn icafe(lookup: &IcafeLookup) -> Self {
        Self::new(Operation::ICafe)
            .with_optional("icafe_id", lookup.icafe_id)
            .with_optional("room_nr", lookup.room_nr.as_deref())
            .with_optional("date_of_birth", lookup.date_of_birth)
            .with_optional("last_name", lookup.last_name.as_deref())
            .with_optional("pin", lookup.pin)
    }

    pub fn person_image(person_id: i64) -> Self {
        Self::new(Operation::PersonImage).with("person_id", person_id)
    }

    pub fn quick_code() -> Self {
        Self::new(Operation::QuickCode)
    }

    pub fn sailor_manifest(
        installation_code: Option<&str>,
        voyage_embark_date: Option<NaiveDate>,
        voyage_debark_date: Option<NaiveDate>,
    ) -> Self {
        Self::new(Operation::SailorManifest)
            .with_optional("installation_code", installation_code)
            .with_optional("voyage_embark_date", voyage_embark_date)
            .with_optional("voyage_debark_date", voyage_debark_date)
    }

    pub fn receipt_image(receipt_id: i64) -> Self {
        Self::new(Operation::ReceiptImage).with("receipt_id", receipt_id)
    }

    pub fn person_invoice(person_id: i64) -> Self {
        Self::new(Operation::PersonInvoice).with("person_id", person_id)
    }

    fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        let upstream_key = self
            .operation
            .descriptor()
            .params
            .iter()
            .find(|spec| spec.name == name)
            .map_or(name, |spec| spec.upstream_key);
        self.query.push((upstream_key, value.to_string()));
        self
    }

    fn with_optional(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }
}
