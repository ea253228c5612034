use crate::system_info::get_system_info;

pub fn show_system_info() -> String {
    tracing::debug!("Showing system info");
    get_system_info()
}
