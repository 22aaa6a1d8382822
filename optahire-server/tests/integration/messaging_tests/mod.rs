mod test_media_toggles;
mod test_unroutable_messages;
