use echotb::scenarios::*;

echotb::run_scenarios!(
    register_round_trip,
    register_round_trip_stream,
    micro_port_round_trip,
    round_trip_without_stalls,
    ack_idle_in_reset,
    ack_idle_no_clock,
);
