pub mod complaints;
pub mod connection;
pub mod messages;
pub mod orders;
pub(crate) mod schema;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod users;

pub use complaints::{
    AttachmentBatch, ImageUpload, attach_image, attach_images, get_complaint, list_all,
    list_for_report, list_images, submit_complaint, update_status,
};
pub use connection::{DbPool, init_db};
pub use messages::{list_messages, post_message};
pub use orders::{create_dispatch, list_dispatches, place_order};
pub use users::{authenticate, create_account, get_user, hash_password, seed_accounts};
