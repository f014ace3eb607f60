//! Employee self-service portal.

use super::{
    FieldKind::{Alpha, Amount, Date, Secret, Text},
    InputField, LoginCheck, Method, Operation, OutputField, Portal, ResultShape, Upstream,
    RFC_FUNCTIONS,
};

const EMPLOYEE: InputField = InputField::required("empId", "I_PERNR", Alpha(8));

const fn soap(function: &'static str) -> Upstream {
    Upstream::Soap {
        service: "zemp_portal",
        namespace: RFC_FUNCTIONS,
        function,
    }
}

pub static OPERATIONS: &[Operation] = &[
    Operation {
        portal: Portal::Employee,
        name: "login",
        route: "/api/login",
        method: Method::Post,
        summary: "Validate employee credentials",
        inputs: &[EMPLOYEE, InputField::required("password", "I_PASSWORD", Secret)],
        upstream: soap("ZFM_EMP_LOGIN"),
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
        portal: Portal::Employee,
        name: "profile",
        route: "/api/profile",
        method: Method::Post,
        summary: "Personnel master data",
        inputs: &[EMPLOYEE],
        upstream: soap("ZFM_EMP_PROFILE"),
        result: ResultShape::Record(&["ES_PROFILE"]),
        fields: &[
            OutputField::new("PERNR", "empId", Alpha(8)),
            OutputField::new("ENAME", "name", Text),
            OutputField::new("ORGTX", "orgUnit", Text),
            OutputField::new("PLSTX", "position", Text),
            OutputField::new("GBDAT", "dateOfBirth", Date),
            OutputField::new("BEGDA", "hireDate", Date),
            OutputField::new("EMAIL", "email", Text),
            OutputField::new("PHONE", "phone", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Employee,
        name: "leave-data",
        route: "/api/leave-data",
        method: Method::Post,
        summary: "Recorded absences and quota balance",
        inputs: &[EMPLOYEE],
        upstream: soap("ZFM_EMP_LEAVE"),
        result: ResultShape::List(&["IT_LEAVE", "item"]),
        fields: &[
            OutputField::new("AWART", "absenceType", Text),
            OutputField::new("ATEXT", "description", Text),
            OutputField::new("BEGDA", "startDate", Date),
            OutputField::new("ENDDA", "endDate", Date),
            OutputField::new("ABWTG", "days", Amount),
            OutputField::new("STATUS", "status", Text),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Employee,
        name: "leave-request",
        route: "/api/leave-request",
        method: Method::Post,
        summary: "Submit an absence request",
        inputs: &[
            EMPLOYEE,
            InputField::required("absenceType", "I_AWART", Text),
            InputField::required("startDate", "I_BEGDA", Date),
            InputField::required("endDate", "I_ENDDA", Date),
            InputField::optional("reason", "I_REASON", Text),
        ],
        upstream: soap("ZFM_EMP_LEAVE_REQUEST"),
        result: ResultShape::Record(&[]),
        fields: &[
            OutputField::new("E_STATUS", "status", Text),
            OutputField::new("E_MESSAGE", "message", Text),
            OutputField::new("E_REQUEST_ID", "requestId", Alpha(10)),
        ],
        login: None,
    },
    Operation {
        portal: Portal::Employee,
        name: "payslip",
        route: "/api/payslip",
        method: Method::Post,
        summary: "Payslip of a payroll period as base64 PDF",
        inputs: &[EMPLOYEE, InputField::required("period", "I_PERIOD", Text)],
        upstream: soap("ZFM_EMP_PAYSLIP"),
        result: ResultShape::Record(&[]),
        fields: &[
            OutputField::new("E_PERIOD", "period", Text),
            OutputField::new("E_PDF", "pdf", Text),
        ],
        login: None,
    },
];
