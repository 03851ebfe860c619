pub mod profile_handler;

pub use profile_handler::{
    __path_change_email, __path_delete_account, __path_get_profile, __path_update_profile,
    change_email, delete_account, get_profile, update_profile,
};
