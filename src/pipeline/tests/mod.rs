pub(crate) mod support;

mod test_head_family;
