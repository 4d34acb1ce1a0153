pub mod depict;
pub mod molecule;
pub mod molzip;
pub mod smiles;
pub mod toolkit;

