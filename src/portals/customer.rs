//! Customer portal: account data, sales documents and receivables.

use super::{
    FieldKind::{Alpha, Amount, Date, Secret, Text},
    InputField, LoginCheck, Method, Operation, OutputField, Portal, ResultShape, Upstream,
    RFC_FUNCTIONS,
};

const CUSTOMER: InputField = InputField::required("customerId", "I_KUNNR", Alpha(10));

const fn soap(function: &'static str) -> Upstream {
    Upstream::Soap {
        service: "zcust_portal",
        namespace: RFC_FUNCTIONS,
        function,
    }
}

pub static OPERATIONS: &[Operation] = &[
    Operation {
        portal: Portal::Customer,
        name: "login",
        route: "/api/login",
        method: Method::Post,
        summary: "Validate customer credentials",
        inputs: &[
            CUSTOMER,
            InputField::required("password", "I_PASSWORD", Secret),
        ],
        upstream: soap("ZFM_CUST_LOGIN"),
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
        portal: Portal::Customer,
        name: "profile",
        route: "/api/profile",
        method: Method::Post,
        summary: "Customer master data",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_PROFILE"),
        result: ResultShape::Record(&["ES_PROFILE"]),
        fields: &[
            OutputField::new("KUNNR", "customerId", Alpha(10)),
            OutputField::new("NAME1", "name", Text),
            OutputField::new("STRAS", "street", Text),
            OutputField::new("ORT01", "city", Text),
            OutputField::new("PSTLZ", "postalCode", Text),
            OutputField::new("REGIO", "region", Text),
            OutputField::new("LAND1", "country", Text),
            OutputField::new("TELF1", "phone", Text),
            OutputField::new("SMTP_ADDR", "email", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "inquiry",
        route: "/api/inquiry",
        method: Method::Post,
        summary: "Open and historic inquiries",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_INQUIRY"),
        result: ResultShape::List(&["IT_INQUIRY", "item"]),
        fields: &[
            OutputField::new("VBELN", "documentNumber", Alpha(10)),
            OutputField::new("ERDAT", "createdOn", Date),
            OutputField::new("AUART", "documentType", Text),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("ARKTX", "description", Text),
            OutputField::new("KWMENG", "quantity", Amount),
            OutputField::new("VRKME", "unit", Text),
            OutputField::new("NETWR", "netValue", Amount),
            OutputField::new("WAERK", "currency", Text),
            OutputField::new("ANGDT", "validFrom", Date),
            OutputField::new("BNDDT", "validTo", Date),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "sales-order-data",
        route: "/api/sales-order-data",
        method: Method::Post,
        summary: "Sales order items",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_SALES_ORDER"),
        result: ResultShape::List(&["IT_SALES", "item"]),
        fields: &[
            OutputField::new("VBELN", "documentNumber", Alpha(10)),
            OutputField::new("POSNR", "itemNumber", Alpha(6)),
            OutputField::new("ERDAT", "createdOn", Date),
            OutputField::new("AUART", "documentType", Text),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("ARKTX", "description", Text),
            OutputField::new("KWMENG", "quantity", Amount),
            OutputField::new("VRKME", "unit", Text),
            OutputField::new("NETWR", "netValue", Amount),
            OutputField::new("WAERK", "currency", Text),
            OutputField::new("VDATU", "requestedDelivery", Date),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "delivery",
        route: "/api/delivery",
        method: Method::Post,
        summary: "Outbound deliveries",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_DELIVERY"),
        result: ResultShape::List(&["IT_DELIVERY", "item"]),
        fields: &[
            OutputField::new("VBELN", "documentNumber", Alpha(10)),
            OutputField::new("LFDAT", "deliveryDate", Date),
            OutputField::new("LFART", "documentType", Text),
            OutputField::new("MATNR", "material", Alpha(18)),
            OutputField::new("ARKTX", "description", Text),
            OutputField::new("LFIMG", "quantity", Amount),
            OutputField::new("VRKME", "unit", Text),
            OutputField::new("VGBEL", "salesOrder", Alpha(10)),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "credit-memo",
        route: "/api/credit-memo",
        method: Method::Post,
        summary: "Credit memos issued to the customer",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_CREDIT_MEMO"),
        result: ResultShape::List(&["IT_MEMO", "item"]),
        fields: MEMO_FIELDS,
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "debit-memo",
        route: "/api/debit-memo",
        method: Method::Post,
        summary: "Debit memos issued to the customer",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_DEBIT_MEMO"),
        result: ResultShape::List(&["IT_MEMO", "item"]),
        fields: MEMO_FIELDS,
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "aging-data",
        route: "/api/aging-data",
        method: Method::Post,
        summary: "Open receivables with days overdue",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_AGING"),
        result: ResultShape::List(&["IT_AGING", "item"]),
        fields: &[
            OutputField::new("BELNR", "documentNumber", Alpha(10)),
            OutputField::new("GJAHR", "fiscalYear", Text),
            OutputField::new("BUDAT", "postingDate", Date),
            OutputField::new("ZFBDT", "baselineDate", Date),
            OutputField::new("FAEDT", "dueDate", Date),
            OutputField::new("DMBTR", "amount", Amount),
            OutputField::new("WAERS", "currency", Text),
            OutputField::new("AGING", "agingDays", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "invoice-data",
        route: "/api/invoice-data",
        method: Method::Post,
        summary: "Billing documents",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_INVOICE"),
        result: ResultShape::List(&["IT_INVOICE", "item"]),
        fields: &[
            OutputField::new("VBELN", "documentNumber", Alpha(10)),
            OutputField::new("FKDAT", "billingDate", Date),
            OutputField::new("FKART", "documentType", Text),
            OutputField::new("NETWR", "netValue", Amount),
            OutputField::new("MWSBK", "taxAmount", Amount),
            OutputField::new("WAERK", "currency", Text),
            OutputField::new("AUBEL", "salesOrder", Alpha(10)),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "invoice-pdf",
        route: "/api/invoice-pdf",
        method: Method::Post,
        summary: "Printable billing document as base64 PDF",
        inputs: &[
            CUSTOMER,
            InputField::required("invoiceNumber", "I_VBELN", Alpha(10)),
        ],
        upstream: soap("ZFM_CUST_INVOICE_PDF"),
        result: ResultShape::Record(&[]),
        fields: &[
            OutputField::new("E_VBELN", "documentNumber", Alpha(10)),
            OutputField::new("E_PDF", "pdf", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Customer,
        name: "overall-sales-data",
        route: "/api/overall-sales-data",
        method: Method::Post,
        summary: "All sales documents across categories",
        inputs: &[CUSTOMER],
        upstream: soap("ZFM_CUST_OVERALL_SALES"),
        result: ResultShape::List(&["IT_OVERALL", "item"]),
        fields: &[
            OutputField::new("VBELN", "documentNumber", Alpha(10)),
            OutputField::new("AUDAT", "documentDate", Date),
            OutputField::new("VBTYP", "category", Text),
            OutputField::new("AUART", "documentType", Text),
            OutputField::new("NETWR", "netValue", Amount),
            OutputField::new("WAERK", "currency", Text),
        ],
        login: None,
    },
];

const MEMO_FIELDS: &[OutputField] = &[
    OutputField::new("VBELN", "documentNumber", Alpha(10)),
    OutputField::new("FKDAT", "billingDate", Date),
    OutputField::new("FKART", "documentType", Text),
    OutputField::new("MATNR", "material", Alpha(18)),
    OutputField::new("FKIMG", "quantity", Amount),
    OutputField::new("NETWR", "netValue", Amount),
    OutputField::new("WAERK", "currency", Text),
];
