mod board_engine;
mod platform_api;
mod table_binding;
mod withdrawal_flow;
mod withdrawal_log;
