//! Maintenance portal: plant notifications and orders read over OData.

use super::{
    FieldKind::{Alpha, Date, Secret, Text},
    InputField, LoginCheck, Method, Operation, OutputField, Portal, ResultShape, Upstream,
    RFC_FUNCTIONS,
};

const SERVICE: &str = "ZPM_MAINT_SRV";

/// Personnel number; OData filters reference it as `{I_PERNR}`.
const EMPLOYEE: InputField = InputField::required("empId", "I_PERNR", Alpha(8));

pub static OPERATIONS: &[Operation] = &[
    Operation {
        portal: Portal::Maintenance,
        name: "login",
        route: "/api/login",
        method: Method::Post,
        summary: "Validate maintenance engineer credentials",
        inputs: &[EMPLOYEE, InputField::required("password", "I_PASSWORD", Secret)],
        upstream: Upstream::Soap {
            service: "zmaint_portal",
            namespace: RFC_FUNCTIONS,
            function: "ZFM_MAINT_LOGIN",
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
        portal: Portal::Maintenance,
        name: "plants",
        route: "/api/plants",
        method: Method::Get,
        summary: "Plants the engineer is assigned to",
        inputs: &[EMPLOYEE],
        upstream: Upstream::OData {
            service: SERVICE,
            entity_set: "PlantSet",
            filter: "Pernr eq '{I_PERNR}'",
        },
        result: ResultShape::List(&["results"]),
        fields: &[
            OutputField::new("Werks", "plant", Text),
            OutputField::new("Name1", "name", Text),
            OutputField::new("Ort01", "city", Text),
            OutputField::new("Land1", "country", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Maintenance,
        name: "notifications",
        route: "/api/notifications",
        method: Method::Get,
        summary: "Maintenance notifications of a plant",
        inputs: &[
            EMPLOYEE,
            InputField::required("plant", "plant", Text),
        ],
        upstream: Upstream::OData {
            service: SERVICE,
            entity_set: "NotificationSet",
            filter: "Iwerk eq '{plant}'",
        },
        result: ResultShape::List(&["results"]),
        fields: &[
            OutputField::new("Qmnum", "notificationNumber", Alpha(12)),
            OutputField::new("Qmart", "notificationType", Text),
            OutputField::new("Qmtxt", "description", Text),
            OutputField::new("Equnr", "equipment", Alpha(18)),
            OutputField::new("Tplnr", "functionalLocation", Text),
            OutputField::new("Priok", "priority", Text),
            OutputField::new("Qmdat", "reportedOn", Date),
            OutputField::new("Iwerk", "plant", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Maintenance,
        name: "work-orders",
        route: "/api/work-orders",
        method: Method::Get,
        summary: "Maintenance work orders of a plant",
        inputs: &[
            EMPLOYEE,
            InputField::required("plant", "plant", Text),
        ],
        upstream: Upstream::OData {
            service: SERVICE,
            entity_set: "WorkOrderSet",
            filter: "Iwerk eq '{plant}'",
        },
        result: ResultShape::List(&["results"]),
        fields: &[
            OutputField::new("Aufnr", "orderNumber", Alpha(12)),
            OutputField::new("Auart", "orderType", Text),
            OutputField::new("Ktext", "description", Text),
            OutputField::new("Equnr", "equipment", Alpha(18)),
            OutputField::new("Gstrp", "basicStart", Date),
            OutputField::new("Gltrp", "basicFinish", Date),
            OutputField::new("Sttxt", "status", Text),
            OutputField::new("Iwerk", "plant", Text),
        ],
        login: None,
    },
];
