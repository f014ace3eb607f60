//! Vendor portal: procurement documents and payables.

use super::{
    FieldKind::{Alpha, Amount, Date, Secret, Text},
    InputField, LoginCheck, Method, Operation, OutputField, Portal, ResultShape, Upstream,
    RFC_FUNCTIONS,
};

const VENDOR: InputField = InputField::required("vendorId", "I_LIFNR", Alpha(10));

const fn soap(function: &'static str) -> Upstream {
    Upstream::Soap {
        service: "zvend_portal",
        namespace: RFC_FUNCTIONS,
        function,
    }
}

pub static OPERATIONS: &[Operation] = &[
    Operation {
        portal: Portal::Vendor,
        name: "login",
        route: "/api/login",
        method: Method::Post,
        summary: "Validate vendor credentials",
        inputs: &[VENDOR, InputField::required("password", "I_PASSWORD", Secret)],
        upstream: soap("ZFM_VEND_LOGIN"),
        result: ResultShape::Record(&[]),
        fields: &[
            OutputField::new("E_STATUS", "status", Text),
            OutputField::new("E_MESSAGE", "message", Text),
            OutputField::new("E_NAME", "name", Text),
        ],
        login: Some(LoginCheck {
            status: "status",
            success: "S",
            message: "message",
        }),
    },
    Operation {
        portal: Portal::Vendor,
        name: "profile",
        route: "/api/profile",
        method: Method::Post,
        summary: "Vendor master data",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_PROFILE"),
        result: ResultShape::Record(&["ES_PROFILE"]),
        fields: &[
            OutputField::new("LIFNR", "vendorId", Alpha(10)),
            OutputField::new("NAME1", "name", Text),
            OutputField::new("STRAS", "street", Text),
            OutputField::new("ORT01", "city", Text),
            OutputField::new("PSTLZ", "postalCode", Text),
            OutputField::new("LAND1", "country", Text),
            OutputField::new("TELF1", "phone", Text),
            OutputField::new("SMTP_ADDR", "email", Text),
            OutputField::new("STCEG", "vatNumber", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "rfq",
        route: "/api/rfq",
        method: Method::Post,
        summary: "Requests for quotation addressed to the vendor",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_RFQ"),
        result: ResultShape::List(&["IT_RFQ", "item"]),
        fields: &[
            OutputField::new("EBELN", "documentNumber", Alpha(10)),
            OutputField::new("EBELP", "itemNumber", Alpha(5)),
            OutputField::new("BEDAT", "documentDate", Date),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("TXZ01", "description", Text),
            OutputField::new("KTMNG", "quantity", Amount),
            OutputField::new("MEINS", "unit", Text),
            OutputField::new("ANGDT", "quotationDeadline", Date),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "purchase-order",
        route: "/api/purchase-order",
        method: Method::Post,
        summary: "Purchase order items",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_PURCHASE_ORDER"),
        result: ResultShape::List(&["IT_PO", "item"]),
        fields: &[
            OutputField::new("EBELN", "documentNumber", Alpha(10)),
            OutputField::new("EBELP", "itemNumber", Alpha(5)),
            OutputField::new("BEDAT", "documentDate", Date),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("TXZ01", "description", Text),
            OutputField::new("MENGE", "quantity", Amount),
            OutputField::new("MEINS", "unit", Text),
            OutputField::new("NETPR", "netPrice", Amount),
            OutputField::new("WAERS", "currency", Text),
            OutputField::new("EINDT", "deliveryDate", Date),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "goods-receipt",
        route: "/api/goods-receipt",
        method: Method::Post,
        summary: "Goods receipts posted against the vendor's orders",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_GOODS_RECEIPT"),
        result: ResultShape::List(&["IT_GR", "item"]),
        fields: &[
            OutputField::new("MBLNR", "documentNumber", Alpha(10)),
            OutputField::new("MJAHR", "fiscalYear", Text),
            OutputField::new("BUDAT", "postingDate", Date),
            OutputField::new("EBELN", "purchaseOrder", Alpha(10)),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("MENGE", "quantity", Amount),
            OutputField::new("MEINS", "unit", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "invoice",
        route: "/api/invoice",
        method: Method::Post,
        summary: "Vendor invoices received",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_INVOICE"),
        result: ResultShape::List(&["IT_INVOICE", "item"]),
        fields: &[
            OutputField::new("BELNR", "documentNumber", Alpha(10)),
            OutputField::new("GJAHR", "fiscalYear", Text),
            OutputField::new("BLDAT", "invoiceDate", Date),
            OutputField::new("RMWWR", "grossAmount", Amount),
            OutputField::new("WAERS", "currency", Text),
            OutputField::new("EBELN", "purchaseOrder", Alpha(10)),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "payment-aging",
        route: "/api/payment-aging",
        method: Method::Post,
        summary: "Open payables with days until or past due",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_AGING"),
        result: ResultShape::List(&["IT_AGING", "item"]),
        fields: &[
            OutputField::new("BELNR", "documentNumber", Alpha(10)),
            OutputField::new("BUDAT", "postingDate", Date),
            OutputField::new("FAEDT", "dueDate", Date),
            OutputField::new("DMBTR", "amount", Amount),
            OutputField::new("WAERS", "currency", Text),
            OutputField::new("AGING", "agingDays", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Vendor,
        name: "credit-debit-memo",
        route: "/api/credit-debit-memo",
        method: Method::Post,
        summary: "Credit and debit memos on the vendor account",
        inputs: &[VENDOR],
        upstream: soap("ZFM_VEND_MEMO"),
        result: ResultShape::List(&["IT_MEMO", "item"]),
        fields: &[
            OutputField::new("BELNR", "documentNumber", Alpha(10)),
            OutputField::new("BLART", "documentType", Text),
            OutputField::new("BUDAT", "postingDate", Date),
            OutputField::new("DMBTR", "amount", Amount),
            OutputField::new("WAERS", "currency", Text),
            OutputField::new("SHKZG", "debitCredit", Text),
        ],
        login: None,
    },
];
