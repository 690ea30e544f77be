pub(crate) mod health_check_controller;
pub(crate) mod notification_controller;
pub(crate) mod subscriber_controller;
