mod test_concurrent_offers_get_distinct_workers;
mod test_no_servers_available;
mod test_request_server_reservation;
