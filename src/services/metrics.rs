use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref SIGN_INS_COUNTER: CounterVec = register_counter_vec!(
        "api_sign_ins_total",
        "Sign-in attempts per centre and outcome",
        &["centre", "status"]
    ).unwrap();

    pub static ref ATTENDANCE_WRITES_COUNTER: CounterVec = register_counter_vec!(
        "api_attendance_writes_total",
        "Attendance writes per centre and kind (patch or replace)",
        &["centre", "kind"]
    ).unwrap();

    pub static ref CHAT_MESSAGES_COUNTER: CounterVec = register_counter_vec!(
        "api_chat_messages_total",
        "Chat messages and replies per centre",
        &["centre", "kind"]
    ).unwrap();

    pub static ref REPORTS_COUNTER: CounterVec = register_counter_vec!(
        "api_reports_total",
        "Reports served per centre and report type",
        &["centre", "report"]
    ).unwrap();
}
