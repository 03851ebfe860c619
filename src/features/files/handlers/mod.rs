pub mod file_handler;

pub use file_handler::{
    __path_change_visibility, __path_delete_file, __path_download_by_id, __path_download_by_name,
    __path_get_file_info, __path_get_file_info_by_id, __path_get_storage_info, __path_list_files,
    __path_register_metadata, __path_rename_file, __path_set_file_status, __path_upload_content,
    change_visibility, delete_file, download_by_id, download_by_name, get_file_info,
    get_file_info_by_id, get_storage_info, list_files, register_metadata, rename_file,
    set_file_status, upload_content,
};
