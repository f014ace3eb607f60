//! Shop-floor portal: planned and production orders read over OData.

use super::{
    FieldKind::{Alpha, Amount, Date, Secret, Text},
    InputField, LoginCheck, Method, Operation, OutputField, Portal, ResultShape, Upstream,
    RFC_FUNCTIONS,
};

const SERVICE: &str = "ZPP_SHOPFLOOR_SRV";

/// Personnel number; OData filters reference it as `{I_PERNR}`.
const EMPLOYEE: InputField = InputField::required("empId", "I_PERNR", Alpha(8));

pub static OPERATIONS: &[Operation] = &[
    Operation {
        portal: Portal::ShopFloor,
        name: "login",
        route: "/api/login",
        method: Method::Post,
        summary: "Validate shop-floor operator credentials",
        inputs: &[EMPLOYEE, InputField::required("password", "I_PASSWORD", Secret)],
        upstream: Upstream::Soap {
            service: "zsf_portal",
            namespace: RFC_FUNCTIONS,
            function: "ZFM_SF_LOGIN",
        },
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
        portal: Portal::ShopFloor,
        name: "planned-orders",
        route: "/api/planned-orders",
        method: Method::Get,
        summary: "Planned orders of a plant",
        inputs: &[
            EMPLOYEE,
            InputField::required("plant", "plant", Text),
        ],
        upstream: Upstream::OData {
            service: SERVICE,
            entity_set: "PlannedOrderSet",
            filter: "Plwrk eq '{plant}'",
        },
        result: ResultShape::List(&["results"]),
        fields: &[
            OutputField::new("Plnum", "plannedOrder", Alpha(10)),
            OutputField::new("Matnr", "material", Alpha(18)),
            OutputField::new("Gsmng", "quantity", Amount),
            OutputField::new("Meins", "unit", Text),
            OutputField::new("Psttr", "startDate", Date),
            OutputField::new("Pedtr", "endDate", Date),
            OutputField::new("Plwrk", "plant", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::ShopFloor,
        name: "production-orders",
        route: "/api/production-orders",
        method: Method::Get,
        summary: "Production orders of a plant",
        inputs: &[
            EMPLOYEE,
            InputField::required("plant", "plant", Text),
        ],
        upstream: Upstream::OData {
            service: SERVICE,
            entity_set: "ProductionOrderSet",
            filter: "Werks eq '{plant}'",
        },
        result: ResultShape::List(&["results"]),
        fields: &[
            OutputField::new("Aufnr", "orderNumber", Alpha(12)),
            OutputField::new("Matnr", "material", Alpha(18)),
            OutputField::new("Gamng", "quantity", Amount),
            OutputField::new("Gmein", "unit", Text),
            OutputField::new("Gstrp", "basicStart", Date),
            OutputField::new("Gltrp", "basicFinish", Date),
            OutputField::new("Sttxt", "status", Text),
            OutputField::new("Werks", "plant", Text),
        ],
        login: None,
    },
];
