pub mod web_push_client;
