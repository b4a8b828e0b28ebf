mod test_request_and_release;
mod test_waiter_disconnect;
