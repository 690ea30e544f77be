pub(crate) mod authenticated_subscriber;
