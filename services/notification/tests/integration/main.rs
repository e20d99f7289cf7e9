mod consumer_test;
mod hub_test;
