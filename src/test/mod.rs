mod network_model;
mod project_store;
mod script_generator;
mod trace_player;
