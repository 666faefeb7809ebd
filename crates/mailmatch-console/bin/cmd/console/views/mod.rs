pub(crate) mod bottom_bar;
pub(crate) mod groups;
pub(crate) mod inspect;
pub(crate) mod logs;
pub(crate) mod main_view;
