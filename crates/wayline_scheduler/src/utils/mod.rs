pub(crate) mod newtype_index;
