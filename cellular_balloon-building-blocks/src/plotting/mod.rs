mod contour_2d;
