mod test_direct_call_flow;
mod test_unroutable_messages_dropped;
