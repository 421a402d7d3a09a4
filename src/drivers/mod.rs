pub mod mpl3115a2;
