pub mod db_utils;
pub mod matricule_index;
pub mod overtime;
